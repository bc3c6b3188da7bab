//! The player registry: every logged-in player, keyed by id.
//!
//! # Concurrency note
//!
//! `PlayerRegistry` is a plain `HashMap` with `&mut self` mutators. The
//! server wraps it in a `tokio::sync::RwLock`; lookups take the read lock,
//! login and teardown take the write lock.

use std::collections::HashMap;

use nightfall_protocol::{PlayerId, RoomId};

use crate::{Player, SessionError};

/// Registry entry: the player plus a weak reference to their room.
///
/// The room id is only a back-pointer for routing. Membership itself is
/// owned by the room's roster.
#[derive(Debug, Clone)]
pub struct PlayerEntry {
    pub player: Player,
    pub room: Option<RoomId>,
}

/// All logged-in players.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, PlayerEntry>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly logged-in player, not yet in any room.
    pub fn register(&mut self, player: Player) -> Result<(), SessionError> {
        let id = player.id();
        if self.players.contains_key(&id) {
            return Err(SessionError::AlreadyRegistered(id));
        }
        self.players.insert(id, PlayerEntry { player, room: None });
        tracing::debug!(player_id = %id, total = self.players.len(), "player registered");
        Ok(())
    }

    /// Removes a player, returning their entry (and so their last room).
    pub fn remove(&mut self, id: &PlayerId) -> Option<PlayerEntry> {
        let entry = self.players.remove(id);
        if entry.is_some() {
            tracing::debug!(player_id = %id, total = self.players.len(), "player removed");
        }
        entry
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id).map(|entry| &entry.player)
    }

    /// The room the player is currently in, if any.
    pub fn room_of(&self, id: &PlayerId) -> Option<&RoomId> {
        self.players.get(id).and_then(|entry| entry.room.as_ref())
    }

    /// Points the player's back-reference at a room (or clears it).
    pub fn set_room(&mut self, id: &PlayerId, room: Option<RoomId>) -> Result<(), SessionError> {
        let entry = self
            .players
            .get_mut(id)
            .ok_or(SessionError::NotFound(*id))?;
        entry.room = room;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Outbox;

    fn player(name: &str) -> Player {
        let (outbox, _rx) = Outbox::channel(8, Duration::from_secs(1));
        Player::new(PlayerId::generate(), name, outbox)
    }

    #[test]
    fn test_register_then_get() {
        let mut registry = PlayerRegistry::new();
        let alice = player("alice");
        let id = alice.id();

        registry.register(alice).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().name(), "alice");
        assert!(registry.room_of(&id).is_none());
    }

    #[test]
    fn test_register_duplicate_id_fails() {
        let mut registry = PlayerRegistry::new();
        let alice = player("alice");
        registry.register(alice.clone()).unwrap();

        let err = registry.register(alice).unwrap_err();
        assert!(matches!(err, SessionError::AlreadyRegistered(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_room_and_remove_returns_last_room() {
        let mut registry = PlayerRegistry::new();
        let alice = player("alice");
        let id = alice.id();
        registry.register(alice).unwrap();

        let room = RoomId::from("deadbeef");
        registry.set_room(&id, Some(room.clone())).unwrap();
        assert_eq!(registry.room_of(&id), Some(&room));

        let entry = registry.remove(&id).unwrap();
        assert_eq!(entry.room, Some(room));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_set_room_unknown_player_is_not_found() {
        let mut registry = PlayerRegistry::new();
        let err = registry
            .set_room(&PlayerId::generate(), None)
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[test]
    fn test_remove_unknown_player_is_none() {
        let mut registry = PlayerRegistry::new();
        assert!(registry.remove(&PlayerId::generate()).is_none());
    }
}
