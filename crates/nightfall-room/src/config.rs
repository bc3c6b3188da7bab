//! Room configuration and state machine.

use nightfall_protocol::RoleType;

use crate::RoomError;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Limits applied when a room is created.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Longest accepted room name, in characters.
    pub max_name_len: usize,

    /// Role slots used when a CREATE_ROOM request lists none.
    pub default_roles: Vec<RoleType>,

    /// Fewest role slots a room may have.
    pub min_seats: usize,

    /// Most role slots a room may have.
    pub max_seats: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_name_len: 50,
            default_roles: RoleType::DEFAULT_TABLE.to_vec(),
            min_seats: 1,
            max_seats: 16,
        }
    }
}

impl RoomConfig {
    /// Trims and checks a room name.
    pub fn validate_name(&self, raw: &str) -> Result<String, RoomError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(RoomError::InvalidName("room name must not be empty".into()));
        }
        if name.chars().count() > self.max_name_len {
            return Err(RoomError::InvalidName(format!(
                "room name must be at most {} characters",
                self.max_name_len
            )));
        }
        Ok(name.to_string())
    }

    /// Returns the role slots for a new room: the requested list, or the
    /// default table when the request is empty.
    pub fn resolve_roles(&self, requested: Vec<RoleType>) -> Result<Vec<RoleType>, RoomError> {
        let roles = if requested.is_empty() {
            self.default_roles.clone()
        } else {
            requested
        };
        if roles.len() < self.min_seats || roles.len() > self.max_seats {
            return Err(RoomError::InvalidRoles(format!(
                "a room needs between {} and {} role slots, got {}",
                self.min_seats,
                self.max_seats,
                roles.len()
            )));
        }
        Ok(roles)
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions are strictly ordered and each happens at most once:
///
/// ```text
/// Waiting → Playing → Finished
/// ```
///
/// - **Waiting**: accepting joins and ready toggles. No engine yet.
/// - **Playing**: the engine exists and is running. Triggered by the ready
///   toggle that first fills the room with ready players.
/// - **Finished**: the engine reported a winner. Terminal; the room stays
///   around so late messages get a clear error, and its members are free
///   to create or join another room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    Waiting,
    Playing,
    Finished,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// The only state this one may move to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Playing => write!(f, "Playing"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_next_follows_strict_order() {
        assert_eq!(RoomState::Waiting.next(), Some(RoomState::Playing));
        assert_eq!(RoomState::Playing.next(), Some(RoomState::Finished));
        assert_eq!(RoomState::Finished.next(), None);
    }

    #[test]
    fn test_room_state_can_transition_to() {
        assert!(RoomState::Waiting.can_transition_to(RoomState::Playing));
        assert!(!RoomState::Waiting.can_transition_to(RoomState::Finished));
        assert!(!RoomState::Finished.can_transition_to(RoomState::Waiting));
    }

    #[test]
    fn test_room_state_is_joinable() {
        assert!(RoomState::Waiting.is_joinable());
        assert!(!RoomState::Playing.is_joinable());
        assert!(!RoomState::Finished.is_joinable());
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.max_name_len, 50);
        assert_eq!(config.default_roles.len(), 6);
        assert_eq!(config.max_seats, 16);
    }

    #[test]
    fn test_resolve_roles_uses_default_for_empty_request() {
        let config = RoomConfig::default();
        let roles = config.resolve_roles(Vec::new()).unwrap();
        assert_eq!(roles, RoleType::DEFAULT_TABLE.to_vec());
    }

    #[test]
    fn test_resolve_roles_rejects_too_many_seats() {
        let config = RoomConfig {
            max_seats: 2,
            ..RoomConfig::default()
        };
        let requested = vec![RoleType::Villager; 3];
        assert!(matches!(
            config.resolve_roles(requested),
            Err(RoomError::InvalidRoles(_))
        ));
    }

    #[test]
    fn test_validate_name_limits() {
        let config = RoomConfig::default();
        assert_eq!(config.validate_name("  moonlit den ").unwrap(), "moonlit den");
        assert!(config.validate_name("").is_err());
        assert!(config.validate_name(&"x".repeat(51)).is_err());
        assert!(config.validate_name(&"x".repeat(50)).is_ok());
    }
}
