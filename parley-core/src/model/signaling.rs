use crate::model::connection::ConnectionId;
use crate::model::participant::Participant;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};

/// Envelope payload as the relay sees it: whatever fields the sender put next to the
/// addressing, kept verbatim.
pub type RawPayload = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// A negotiation message addressed to one connection of a room.
///
/// `P` is [`RawPayload`] on the relay and
/// [`NegotiationPayload`](crate::NegotiationPayload) on clients; both produce the same JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<P> {
    pub room_id: RoomId,
    #[serde(rename = "targetConnectionId")]
    pub target: ConnectionId,
    #[serde(rename = "senderConnectionId")]
    pub sender: ConnectionId,
    #[serde(flatten)]
    pub payload: P,
}

/// Frames sent by a client to the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage<P = RawPayload> {
    JoinRoom {
        room_id: RoomId,
        user_id: String,
        display_name: String,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    Signal(Envelope<P>),
    JoinText {
        room_id: RoomId,
    },
    LeaveText {
        room_id: RoomId,
    },
    TypingStart {
        room_id: RoomId,
        user_id: String,
        display_name: String,
    },
    TypingStop {
        room_id: RoomId,
        user_id: String,
        display_name: String,
    },
}

/// Frames sent by the relay to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "op",
    content = "d",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage<P = RawPayload> {
    Welcome {
        connection_id: ConnectionId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    Members {
        room_id: RoomId,
        participants: Vec<Participant>,
    },
    Signal(Envelope<P>),
    TypingStart {
        room_id: RoomId,
        user_id: String,
        display_name: String,
    },
    TypingStop {
        room_id: RoomId,
        user_id: String,
        display_name: String,
    },
}
