use parley_core::ConnectionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Local audio could not be acquired, so the room was never joined.
    #[error("could not join voice: {0}")]
    JoinFailed(String),

    #[error("no connection id yet: the relay has not sent its welcome")]
    NotConnected,

    #[error("media session for {peer} failed: {reason}")]
    Media { peer: ConnectionId, reason: String },

    #[error("relay link closed")]
    RelayClosed,

    #[error("voice client stopped")]
    Stopped,
}

impl ClientError {
    pub(crate) fn media(peer: &ConnectionId, err: anyhow::Error) -> Self {
        Self::Media {
            peer: peer.clone(),
            reason: format!("{:#}", err),
        }
    }
}
