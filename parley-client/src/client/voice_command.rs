use crate::error::ClientError;
use crate::negotiation::NegotiationState;
use parley_core::{ConnectionId, RoomId};
use tokio::sync::oneshot;

pub enum VoiceCommand {
    Join {
        room_id: RoomId,
        user_id: String,
        display_name: String,
        reply: oneshot::Sender<Result<(), ClientError>>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
    SetMuted(bool),
    SetDeafened(bool),
    /// Live sessions and their state, sorted by peer id.
    Peers {
        reply: oneshot::Sender<Vec<(ConnectionId, NegotiationState)>>,
    },
}
