use crate::room::connection_registry::ConnectionRegistry;
use parley_core::{ConnectionId, RoomId};
use std::collections::{HashMap, HashSet};

/// Who is currently looking at which text channel. Only used to fan out typing
/// indicators; messages themselves live elsewhere.
#[derive(Debug, Default)]
pub struct TextChannels {
    subscribers: HashMap<RoomId, HashSet<ConnectionId>>,
    registry: ConnectionRegistry<RoomId>,
}

impl TextChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, room_id: RoomId, connection_id: ConnectionId) {
        self.registry.record_join(&connection_id, &room_id);
        self.subscribers
            .entry(room_id)
            .or_default()
            .insert(connection_id);
    }

    pub fn unsubscribe(&mut self, room_id: &RoomId, connection_id: &ConnectionId) {
        self.registry.record_leave(connection_id, room_id);
        let Some(subscribers) = self.subscribers.get_mut(room_id) else {
            return;
        };
        subscribers.remove(connection_id);
        if subscribers.is_empty() {
            self.subscribers.remove(room_id);
        }
    }

    pub fn forget(&mut self, connection_id: &ConnectionId) {
        for room_id in self.registry.forget_connection(connection_id) {
            self.unsubscribe(&room_id, connection_id);
        }
    }

    /// Subscribers of `room_id` other than `except`.
    pub fn others(&self, room_id: &RoomId, except: &ConnectionId) -> Vec<ConnectionId> {
        self.subscribers
            .get(room_id)
            .map(|subs| subs.iter().filter(|c| *c != except).cloned().collect())
            .unwrap_or_default()
    }
}
