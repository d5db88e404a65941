use parley_core::{ConnectionId, Participant, RoomId};

/// What the voice client reports to its user.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    /// The relay assigned our connection id; joining is possible from now on.
    Ready { connection_id: ConnectionId },
    Joined { room_id: RoomId },
    MembersUpdated { participants: Vec<Participant> },
    PeerConnected { peer: ConnectionId },
    RemoteTrack { peer: ConnectionId, track_id: String },
    PeerLeft { peer: ConnectionId },
    Left { room_id: RoomId },
}
