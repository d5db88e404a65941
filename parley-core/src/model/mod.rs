mod connection;
mod negotiation;
mod participant;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use negotiation::{IceCandidate, NegotiationPayload, SdpKind, SessionDescription};
pub use participant::Participant;
pub use room::RoomId;
pub use signaling::{ClientMessage, Envelope, IceServerConfig, RawPayload, ServerMessage};
