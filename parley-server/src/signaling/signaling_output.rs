use async_trait::async_trait;
use parley_core::{ConnectionId, ServerMessage};

/// What the membership actor needs from the transport: a way to push a frame to
/// one connection.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Frames for connections that are no longer attached are dropped.
    async fn deliver(&self, connection_id: &ConnectionId, msg: ServerMessage);
}
