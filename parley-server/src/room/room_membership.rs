use crate::room::connection_registry::ConnectionRegistry;
use parley_core::{ConnectionId, Participant, RoomId};
use std::collections::HashMap;

/// Full, replacing list of a room's participants together with the room it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub room_id: RoomId,
    pub participants: Vec<Participant>,
}

impl Snapshot {
    /// Connections that must receive this snapshot: exactly the current members.
    pub fn recipients(&self) -> impl Iterator<Item = &ConnectionId> {
        self.participants.iter().map(|p| &p.connection_id)
    }
}

/// Per-room participant lists plus the reverse index used on disconnect.
///
/// Every mutation returns the snapshot that has to be published; delivering it is
/// the caller's job.
#[derive(Debug, Default)]
pub struct RoomMembership {
    rooms: HashMap<RoomId, Vec<Participant>>,
    registry: ConnectionRegistry<RoomId>,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the participant, or overwrites the entry with the same connection id
    /// in place so a re-join keeps its position.
    pub fn join(&mut self, room_id: RoomId, participant: Participant) -> Snapshot {
        self.registry
            .record_join(&participant.connection_id, &room_id);

        let members = self.rooms.entry(room_id.clone()).or_default();
        match members
            .iter_mut()
            .find(|p| p.connection_id == participant.connection_id)
        {
            Some(existing) => *existing = participant,
            None => members.push(participant),
        }

        self.snapshot(&room_id)
    }

    /// Returns `None` when the connection was not a member, so nothing needs publishing.
    pub fn leave(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> Option<Snapshot> {
        self.registry.record_leave(connection_id, room_id);

        let members = self.rooms.get_mut(room_id)?;
        let before = members.len();
        members.retain(|p| &p.connection_id != connection_id);
        if members.len() == before {
            return None;
        }
        if members.is_empty() {
            self.rooms.remove(room_id);
        }

        Some(self.snapshot(room_id))
    }

    pub fn disconnect_all(&mut self, connection_id: &ConnectionId) -> Vec<Snapshot> {
        self.registry
            .forget_connection(connection_id)
            .into_iter()
            .filter_map(|room_id| self.leave(&room_id, connection_id))
            .collect()
    }

    pub fn snapshot(&self, room_id: &RoomId) -> Snapshot {
        Snapshot {
            room_id: room_id.clone(),
            participants: self.rooms.get(room_id).cloned().unwrap_or_default(),
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
