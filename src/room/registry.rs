//! Room registry
//!
//! Maps room ids to live rooms and owns their lifecycle. The registry mutex
//! is always taken before a room mutex, and member attach/detach run while
//! both are held, so a room can never be discarded while a join into it is
//! still in flight.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Room, RoomState, RoomSummary};

/// Default relay channel capacity per room
pub const DEFAULT_ROOM_CAPACITY: usize = 1024;

/// Central registry of active rooms
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    channel_capacity: usize,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ROOM_CAPACITY)
    }

    /// Create a registry whose rooms buffer `channel_capacity` relay messages
    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            channel_capacity,
        }
    }

    fn create_locked(&self, rooms: &mut HashMap<String, Arc<Room>>, room_id: &str) -> Arc<Room> {
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                tracing::info!(room = %room_id, "Room created");
                Arc::new(Room::new(room_id, self.channel_capacity))
            })
            .clone()
    }

    /// Get a room, creating it if this is the first reference to the id
    ///
    /// Concurrent callers with the same unseen id all receive the same room.
    pub fn get_or_create_room(&self, room_id: &str) -> Arc<Room> {
        let mut rooms = self.rooms.lock();
        self.create_locked(&mut rooms, room_id)
    }

    /// Look up a live room
    pub fn room(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.lock().get(room_id).cloned()
    }

    pub fn room_exists(&self, room_id: &str) -> bool {
        self.rooms.lock().contains_key(room_id)
    }

    /// Discard a room if nobody is in it; returns true if it was removed
    pub fn remove_room_if_empty(&self, room_id: &str) -> bool {
        let mut rooms = self.rooms.lock();
        Self::remove_if_empty_locked(&mut rooms, room_id)
    }

    fn remove_if_empty_locked(rooms: &mut HashMap<String, Arc<Room>>, room_id: &str) -> bool {
        let empty = match rooms.get(room_id) {
            Some(room) => room.lock().members.is_empty(),
            None => return false,
        };

        if empty {
            rooms.remove(room_id);
            tracing::info!(room = %room_id, "Room discarded");
        }
        empty
    }

    /// Run `f` against a room (created on demand) with the registry and room
    /// locks held
    pub(crate) fn attach<R>(
        &self,
        room_id: &str,
        f: impl FnOnce(&Arc<Room>, &mut RoomState) -> R,
    ) -> R {
        let mut rooms = self.rooms.lock();
        let room = self.create_locked(&mut rooms, room_id);
        let mut state = room.lock();
        f(&room, &mut state)
    }

    /// Run `f` against an existing room with both locks held, then discard
    /// the room if `f` left it empty
    pub(crate) fn detach<R>(
        &self,
        room_id: &str,
        f: impl FnOnce(&Arc<Room>, &mut RoomState) -> R,
    ) -> Option<R> {
        let mut rooms = self.rooms.lock();
        let room = rooms.get(room_id)?.clone();

        let result = {
            let mut state = room.lock();
            f(&room, &mut state)
        };

        Self::remove_if_empty_locked(&mut rooms, room_id);
        Some(result)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().len()
    }

    /// Ids of all live rooms, sorted
    pub fn room_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rooms.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Summaries of all live rooms, sorted by id
    pub fn summaries(&self) -> Vec<RoomSummary> {
        let rooms: Vec<Arc<Room>> = self.rooms.lock().values().cloned().collect();
        let mut summaries: Vec<RoomSummary> = rooms.iter().map(|r| r.summary()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
