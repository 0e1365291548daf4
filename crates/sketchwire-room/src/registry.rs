//! Room registry: the directory of live rooms.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sketchwire_protocol::RoomCode;
use tokio::sync::Mutex;

use crate::{Room, RoomConfig, SharedRoom};

/// Maps room codes to rooms.
///
/// This is the only place rooms are born or reaped. It is an owned value,
/// not a global: the server builds one and hands it to the coordinator,
/// and each test builds its own.
///
/// # Concurrency
///
/// The directory is a sharded `DashMap`, and each room sits behind its own
/// `tokio::sync::Mutex`. Lookups clone the room's `Arc` and release the
/// shard lock immediately, so the directory is never held while a room
/// lock is awaited. Work on one room never blocks another.
pub struct RoomRegistry {
    rooms: DashMap<RoomCode, SharedRoom>,
    config: RoomConfig,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms use `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Returns the room for `code`, creating it if needed.
    ///
    /// Never replaces a room that already exists: an in-flight game keeps
    /// its state even if a caller reuses its code.
    pub fn create_room(&self, code: &RoomCode) -> SharedRoom {
        self.rooms
            .entry(code.clone())
            .or_insert_with(|| {
                tracing::info!(room = %code, "room created");
                self.new_room(code)
            })
            .clone()
    }

    /// Creates a room only if `code` is free.
    ///
    /// Returns `None` when the code is taken, so callers can retry with a
    /// fresh code.
    pub fn try_create(&self, code: &RoomCode) -> Option<SharedRoom> {
        match self.rooms.entry(code.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                tracing::info!(room = %code, "room created");
                Some(slot.insert(self.new_room(code)).clone())
            }
        }
    }

    pub fn get_room(&self, code: &RoomCode) -> Option<SharedRoom> {
        self.rooms.get(code).map(|r| Arc::clone(r.value()))
    }

    /// Removes the room unconditionally. Returns `true` if it existed.
    pub fn remove_room(&self, code: &RoomCode) -> bool {
        let removed = self.rooms.remove(code).is_some();
        if removed {
            tracing::info!(room = %code, "room removed");
        }
        removed
    }

    /// Removes `code` only if it still maps to `room`.
    ///
    /// Used when the last player leaves: between fetching the room and
    /// removing it, a new room could in principle have taken the code.
    pub fn remove_instance(&self, code: &RoomCode, room: &SharedRoom) -> bool {
        let removed = self
            .rooms
            .remove_if(code, |_, current| Arc::ptr_eq(current, room))
            .is_some();
        if removed {
            tracing::info!(room = %code, "room removed");
        }
        removed
    }

    /// Snapshot of every room handle.
    pub fn list_rooms(&self) -> Vec<SharedRoom> {
        self.rooms.iter().map(|r| Arc::clone(r.value())).collect()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn new_room(&self, code: &RoomCode) -> SharedRoom {
        Arc::new(Mutex::new(Room::new(code.clone(), &self.config)))
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use sketchwire_protocol::ConnectionHandle;

    use super::*;

    #[tokio::test]
    async fn test_create_then_get_is_case_insensitive() {
        let registry = RoomRegistry::default();
        registry.create_room(&RoomCode::new("abc123"));

        let room = registry.get_room(&RoomCode::new("ABC123")).unwrap();
        assert_eq!(room.lock().await.code().as_str(), "ABC123");
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let registry = RoomRegistry::default();
        let code = RoomCode::new("AAAAAA");
        let first = registry.create_room(&code);
        first.lock().await.admit(ConnectionHandle(1), "Alice");

        let second = registry.create_room(&code);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().await.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_try_create_refuses_taken_code() {
        let registry = RoomRegistry::default();
        let code = RoomCode::new("BBBBBB");
        assert!(registry.try_create(&code).is_some());
        assert!(registry.try_create(&code).is_none());
    }

    #[test]
    fn test_remove_room() {
        let registry = RoomRegistry::default();
        let code = RoomCode::new("CCCCCC");
        registry.create_room(&code);
        assert!(registry.remove_room(&code));
        assert!(!registry.remove_room(&code));
        assert!(registry.get_room(&code).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_instance_ignores_replacement() {
        let registry = RoomRegistry::default();
        let code = RoomCode::new("DDDDDD");
        let old = registry.create_room(&code);
        registry.remove_room(&code);
        let new = registry.create_room(&code);

        assert!(!registry.remove_instance(&code, &old));
        assert!(registry.get_room(&code).is_some());
        assert!(registry.remove_instance(&code, &new));
    }

    #[test]
    fn test_list_rooms_snapshot() {
        let registry = RoomRegistry::default();
        registry.create_room(&RoomCode::new("EEEEEE"));
        registry.create_room(&RoomCode::new("FFFFFF"));
        assert_eq!(registry.list_rooms().len(), 2);
    }
}
