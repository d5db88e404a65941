use parley_core::{ConnectionId, Participant, RoomId};
use tokio::sync::oneshot;

/// Commands sent to the membership actor by the WebSocket layer.
#[derive(Debug)]
pub enum RoomCommand {
    Join {
        room_id: RoomId,
        participant: Participant,
    },

    Leave {
        room_id: RoomId,
        connection_id: ConnectionId,
    },

    /// The socket is gone: unwind every voice room and text channel it was in.
    Disconnect { connection_id: ConnectionId },

    JoinText {
        room_id: RoomId,
        connection_id: ConnectionId,
    },

    LeaveText {
        room_id: RoomId,
        connection_id: ConnectionId,
    },

    Typing {
        room_id: RoomId,
        connection_id: ConnectionId,
        user_id: String,
        display_name: String,
        active: bool,
    },

    /// Current participants of a room, answered without publishing anything.
    Members {
        room_id: RoomId,
        reply: oneshot::Sender<Vec<Participant>>,
    },
}
