//! Error types for the room layer.

use nightfall_protocol::{PlayerId, ProtocolError, RoomId, SkillType};

use crate::EngineError;

/// Errors that can occur during room operations.
///
/// A failed operation never leaves the room half-changed: every check runs
/// before the first mutation.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Every role slot is taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// Joins and ready toggles are only accepted while waiting.
    #[error("room {0} is not waiting for players")]
    RoomNotWaiting(RoomId),

    /// The player is already in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// Another caller started the game first.
    #[error("game in room {0} already started")]
    AlreadyStarted(RoomId),

    /// Start was attempted before every member was ready.
    #[error("not every player in room {0} is ready")]
    NotReady(RoomId),

    /// The roster size doesn't match the role slots.
    #[error("room has {actual} players but {expected} role slots")]
    CapacityMismatch { expected: usize, actual: usize },

    /// Game actions need a running game.
    #[error("no game is running in room {0}")]
    GameNotRunning(RoomId),

    /// The skill isn't in the player's allowed set for this phase.
    #[error("{0} is not allowed right now")]
    SkillNotAllowed(SkillType),

    /// Missing, unknown or dead target.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// The room name failed validation.
    #[error("invalid room name: {0}")]
    InvalidName(String),

    /// The role list failed validation.
    #[error("invalid roles: {0}")]
    InvalidRoles(String),

    /// The engine refused the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// An outbound envelope couldn't be built.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
