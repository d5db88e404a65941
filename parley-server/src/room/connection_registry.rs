use parley_core::ConnectionId;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Remembers which rooms each live connection has entered, so a disconnect can
/// unwind every membership in one pass. Pure bookkeeping; every operation is
/// idempotent and missing entries are ignored.
#[derive(Debug)]
pub struct ConnectionRegistry<K> {
    rooms: HashMap<ConnectionId, HashSet<K>>,
}

impl<K> ConnectionRegistry<K>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    pub fn record_join(&mut self, connection_id: &ConnectionId, room: &K) {
        self.rooms
            .entry(connection_id.clone())
            .or_default()
            .insert(room.clone());
    }

    pub fn record_leave(&mut self, connection_id: &ConnectionId, room: &K) {
        let Some(rooms) = self.rooms.get_mut(connection_id) else {
            return;
        };
        rooms.remove(room);
        if rooms.is_empty() {
            self.rooms.remove(connection_id);
        }
    }

    pub fn rooms_for(&self, connection_id: &ConnectionId) -> HashSet<K> {
        self.rooms.get(connection_id).cloned().unwrap_or_default()
    }

    /// Drops the connection and hands back the rooms it was still in.
    pub fn forget_connection(&mut self, connection_id: &ConnectionId) -> HashSet<K> {
        self.rooms.remove(connection_id).unwrap_or_default()
    }
}

impl<K> Default for ConnectionRegistry<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
