//! Room registry: creates and tracks every room.
//!
//! Rooms are never removed. A finished room stays registered for the life of
//! the process so late JOIN_ROOM requests get "game already started"
//! instead of "not found".

use std::collections::HashMap;
use std::sync::Arc;

use nightfall_protocol::{RoleType, RoomId};

use crate::{GameEngine, Room, RoomConfig, RoomError};

/// All rooms, keyed by id.
///
/// Like the player registry this is a plain map; the server puts it behind
/// a `tokio::sync::RwLock`. Rooms themselves are `Arc`-shared so callers can
/// drop the registry lock before working on a room.
pub struct RoomRegistry<E: GameEngine> {
    rooms: HashMap<RoomId, Arc<Room<E>>>,
    config: RoomConfig,
}

impl<E: GameEngine> RoomRegistry<E> {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Validates the request and registers a new, empty room.
    ///
    /// An empty `roles` list gets the configured default table.
    pub fn create(&mut self, name: &str, roles: Vec<RoleType>) -> Result<Arc<Room<E>>, RoomError> {
        let name = self.config.validate_name(name)?;
        let roles = self.config.resolve_roles(roles)?;

        let mut id = RoomId::generate();
        while self.rooms.contains_key(&id) {
            id = RoomId::generate();
        }

        let room = Arc::new(Room::new(id.clone(), name, roles));
        self.rooms.insert(id.clone(), Arc::clone(&room));
        tracing::info!(room_id = %id, name = room.name(), capacity = room.capacity(), "room created");
        Ok(room)
    }

    pub fn get(&self, id: &RoomId) -> Option<Arc<Room<E>>> {
        self.rooms.get(id).cloned()
    }

    /// Like [`RoomRegistry::get`], as a `Result`.
    pub fn require(&self, id: &RoomId) -> Result<Arc<Room<E>>, RoomError> {
        self.get(id).ok_or_else(|| RoomError::NotFound(id.clone()))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
