//! The `GameEngine` trait: the contract between a room and the rules.
//!
//! The room never decides who is a werewolf, which phase comes next, or who
//! won. It owns one engine instance per game and talks to it only through
//! this trait:
//!
//! - **Commands** (`add_participant`, `start`, `submit_skill`, `end_phase`)
//!   are synchronous calls made while the room holds its write lock.
//! - **Queries** (`allowed_skills`, `snapshot`, ...) are read-only.
//! - **Events** flow the other way, pushed into the channel handed out by
//!   [`GameEngine::subscribe`]. The room's translator task turns them into
//!   network messages. A command may emit zero, one or many events; the
//!   room assumes no correspondence between the two.

use std::collections::BTreeSet;

use nightfall_protocol::{Camp, Phase, PlayerId, RoleType, SkillType};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Receiving end of an engine's event stream, in emission order.
pub type EngineEvents = mpsc::UnboundedReceiver<EngineEvent>;

/// Something the engine wants the players to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A new phase began.
    PhaseStarted { phase: Phase, round: u32 },
    /// A player was eliminated.
    PlayerDied { player: PlayerId, cause: DeathCause },
    /// A camp won. Always the last event.
    GameEnded { winner: Camp },
}

/// How a player died. Public: it goes out in the death announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeathCause {
    /// Werewolves at night.
    Killed,
    /// The witch's poison.
    Poisoned,
    /// Voted out during the day.
    Exiled,
}

impl std::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Killed => f.write_str("was killed during the night"),
            Self::Poisoned => f.write_str("was poisoned"),
            Self::Exiled => f.write_str("was exiled by vote"),
        }
    }
}

/// One seat in the engine's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub player: PlayerId,
    pub role: RoleType,
    pub camp: Camp,
    pub alive: bool,
}

/// The engine's view of every participant, in seat order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub seats: Vec<Seat>,
}

impl EngineSnapshot {
    pub fn seat(&self, player: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.player == player)
    }

    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.seat(player).is_some_and(|seat| seat.alive)
    }

    /// Alive players, in seat order.
    pub fn alive(&self) -> Vec<PlayerId> {
        self.seats
            .iter()
            .filter(|seat| seat.alive)
            .map(|seat| seat.player)
            .collect()
    }

    /// Seats holding `role`, dead or alive.
    pub fn with_role(&self, role: RoleType) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(move |seat| seat.role == role)
    }
}

/// What the engine says back to an accepted skill.
///
/// `detail` is private to the submitter (e.g. the camp a seer's check
/// revealed) and only ever goes into their own ACTION_RESULT.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillReceipt {
    pub message: String,
    pub detail: Option<serde_json::Value>,
}

impl SkillReceipt {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Outcome of an `end_phase` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseEffects {
    pub ended: Phase,
    pub next: Phase,
    pub deaths: Vec<PlayerId>,
}

/// Errors reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The role list can't form a game.
    #[error("invalid role setup: {0}")]
    InvalidSetup(String),

    /// More participants than role slots.
    #[error("all {0} seats are taken")]
    SeatsFull(usize),

    /// Participants and role slots don't line up at start.
    #[error("{participants} participants for {seats} seats")]
    SeatCountMismatch { seats: usize, participants: usize },

    /// The participant is already seated.
    #[error("player {0} is already seated")]
    AlreadySeated(PlayerId),

    /// The player isn't one of the participants.
    #[error("player {0} is not in this game")]
    UnknownPlayer(PlayerId),

    /// `start` was called twice.
    #[error("game already started")]
    AlreadyStarted,

    /// A command needs a started game.
    #[error("game has not started")]
    NotStarted,

    /// A command arrived after the game ended.
    #[error("game is over")]
    GameOver,

    /// The skill can't be used by this player now.
    #[error("{skill} is not allowed during {phase}")]
    SkillNotAllowed { skill: SkillType, phase: Phase },

    /// The skill's target was rejected by the rules.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// The player has already used this skill.
    #[error("{0} already used")]
    AlreadyUsed(SkillType),
}

/// A deterministic social-deduction rules engine.
///
/// Implementations must be `Send + Sync + 'static` because the engine lives
/// inside a room that is shared between connection tasks.
pub trait GameEngine: Send + Sync + 'static {
    /// Builds an engine for the given role slots. No participants yet.
    fn new(roles: &[RoleType]) -> Result<Self, EngineError>
    where
        Self: Sized;

    /// Seats a participant. Called once per player, in join order.
    fn add_participant(&mut self, player: PlayerId) -> Result<(), EngineError>;

    /// Hands out the event stream. Called once, before `start`.
    fn subscribe(&mut self) -> EngineEvents;

    /// Assigns roles and enters the first phase.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Applies one skill use.
    fn submit_skill(
        &mut self,
        player: PlayerId,
        skill: SkillType,
        target: Option<PlayerId>,
    ) -> Result<SkillReceipt, EngineError>;

    /// Skills `player` may use in the current phase. Empty for the dead.
    fn allowed_skills(&self, player: PlayerId) -> BTreeSet<SkillType>;

    /// Resolves the current phase and moves to the next one.
    fn end_phase(&mut self) -> Result<PhaseEffects, EngineError>;

    fn current_phase(&self) -> Phase;

    fn current_round(&self) -> u32;

    /// Every participant with role, camp and liveness, in seat order.
    fn snapshot(&self) -> EngineSnapshot;

    /// Tonight's werewolf victim, once the werewolves have chosen.
    fn night_kill_target(&self) -> Option<PlayerId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(role: RoleType, camp: Camp, alive: bool) -> Seat {
        Seat {
            player: PlayerId::generate(),
            role,
            camp,
            alive,
        }
    }

    #[test]
    fn test_snapshot_alive_keeps_seat_order() {
        let snapshot = EngineSnapshot {
            seats: vec![
                seat(RoleType::Werewolf, Camp::Evil, true),
                seat(RoleType::Villager, Camp::Good, false),
                seat(RoleType::Seer, Camp::Good, true),
            ],
        };
        let alive = snapshot.alive();
        assert_eq!(alive, vec![snapshot.seats[0].player, snapshot.seats[2].player]);
        assert!(!snapshot.is_alive(snapshot.seats[1].player));
        assert!(!snapshot.is_alive(PlayerId::generate()));
    }

    #[test]
    fn test_snapshot_with_role() {
        let snapshot = EngineSnapshot {
            seats: vec![
                seat(RoleType::Werewolf, Camp::Evil, true),
                seat(RoleType::Werewolf, Camp::Evil, false),
                seat(RoleType::Witch, Camp::Good, true),
            ],
        };
        assert_eq!(snapshot.with_role(RoleType::Werewolf).count(), 2);
        assert_eq!(snapshot.with_role(RoleType::Guard).count(), 0);
    }

    #[test]
    fn test_death_cause_wire_name() {
        assert_eq!(serde_json::to_string(&DeathCause::Exiled).unwrap(), "\"exiled\"");
    }
}
