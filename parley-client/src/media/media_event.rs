use parley_core::{ConnectionId, IceCandidate};
use std::fmt;

/// Identifies one incarnation of a peer session. A peer whose session is torn down and
/// recreated gets a new tag, so late events from the old one can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTag(pub u64);

impl fmt::Display for SessionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    /// Gathered locally, must be sent to the peer.
    LocalCandidate(IceCandidate),
    RemoteTrack { track_id: String },
    StateChanged(MediaState),
}

/// Something a media session reported on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub peer: ConnectionId,
    pub session: SessionTag,
    pub kind: MediaEventKind,
}
