//! Identifiers and game vocabulary shared by every layer.
//!
//! The role, camp, phase and skill tags are owned semantically by the rules
//! engine; the gateway only carries them between the engine and the wire.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A globally unique identifier for a logged-in player.
///
/// Newtype over a random v4 UUID so ids are collision resistant without any
/// coordination between connections. `#[serde(transparent)]` puts the
/// hyphenated UUID string on the wire, not `{ "0": ... }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A unique identifier for a room.
///
/// Room ids are typed by hand in the terminal client, so they are kept
/// short: the first eight hex digits of a v4 UUID. The registry regenerates
/// on the (rare) collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Number of hex digits in a generated room id.
    pub const LEN: usize = 8;

    /// Generates a fresh short id.
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(Self::LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// A role slot in a room's configuration.
///
/// The ordered list of role slots defines the room's capacity. Which player
/// ends up holding which role is decided by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Werewolf,
    Villager,
    Seer,
    Witch,
    Guard,
}

impl RoleType {
    /// The classic six-seat table: two werewolves, two villagers, a seer and
    /// a witch. Used when a room is created without an explicit role list.
    pub const DEFAULT_TABLE: [RoleType; 6] = [
        RoleType::Werewolf,
        RoleType::Werewolf,
        RoleType::Villager,
        RoleType::Villager,
        RoleType::Seer,
        RoleType::Witch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Werewolf => "werewolf",
            Self::Villager => "villager",
            Self::Seer => "seer",
            Self::Witch => "witch",
            Self::Guard => "guard",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The faction a role plays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Camp {
    Good,
    Evil,
}

impl fmt::Display for Camp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => f.write_str("good"),
            Self::Evil => f.write_str("evil"),
        }
    }
}

/// A phase of the engine's day/night cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Engine created but not started.
    Setup,
    /// Werewolves pick a victim; seer and guard act.
    Night,
    /// The potion holder learns the night's victim and may act.
    Witch,
    /// Deaths are announced; survivors speak.
    Day,
    /// Survivors vote someone out.
    Vote,
    /// A camp has won.
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::Night => "night",
            Self::Witch => "witch",
            Self::Day => "day",
            Self::Vote => "vote",
            Self::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// A role-specific action a player may submit during an eligible phase.
///
/// `Ord` so allowed-skill sets iterate in a stable order on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Kill,
    Check,
    Protect,
    Antidote,
    Poison,
    Speak,
    Vote,
}

impl SkillType {
    /// Whether the skill must name a target player.
    pub fn needs_target(&self) -> bool {
        !matches!(self, Self::Speak)
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Kill => "kill",
            Self::Check => "check",
            Self::Protect => "protect",
            Self::Antidote => "antidote",
            Self::Poison => "poison",
            Self::Speak => "speak",
            Self::Vote => "vote",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// PlayerInfo
// ---------------------------------------------------------------------------

/// The public view of one player, as listed in room and game messages.
///
/// `role_type` is only filled in for the end-of-game reveal; everywhere else
/// it is `None` and omitted from the JSON entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub username: String,
    #[serde(rename = "isAlive")]
    pub is_alive: bool,
    #[serde(rename = "isReady")]
    pub is_ready: bool,
    #[serde(rename = "roleType", default, skip_serializing_if = "Option::is_none")]
    pub role_type: Option<RoleType>,
}
