use parley_core::ConnectionId;

/// Which side of a pair sends the offer: the greater connection id, compared as strings.
pub fn should_initiate(local: &ConnectionId, remote: &ConnectionId) -> bool {
    local > remote
}
