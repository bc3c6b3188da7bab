//! Room lifecycle management for Nightfall.
//!
//! A room owns a roster of players and, once the game starts, one instance
//! of the external rules engine. All room state lives behind a
//! `tokio::sync::RwLock`; engine events are turned into network messages by
//! a per-room translator task.
//!
//! # Key types
//!
//! - [`GameEngine`] — the contract a rules engine implements
//! - [`Room`] — roster, Waiting → Playing → Finished, skill pre-checks
//! - [`RoomRegistry`] — creates rooms and looks them up by id
//! - [`RoomState`] — lifecycle state machine
//! - [`RoomConfig`] — name and seat limits, default role table

mod config;
mod engine;
mod error;
mod registry;
mod room;
mod translator;

pub use config::{RoomConfig, RoomState};
pub use engine::{
    DeathCause, EngineError, EngineEvent, EngineEvents, EngineSnapshot, GameEngine, PhaseEffects,
    Seat, SkillReceipt,
};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{PhaseEnd, ReadyOutcome, Room, SkillOutcome};
