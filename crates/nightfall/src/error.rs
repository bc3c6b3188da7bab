//! Unified error type for the Nightfall server.

use nightfall_protocol::{FramingError, ProtocolError};
use nightfall_room::RoomError;
use nightfall_session::SessionError;
use nightfall_transport::TransportError;

/// How an error is handled at the connection boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Broken framing or a dead socket. Closes the connection.
    Protocol,
    /// A well-framed request that can't be understood: unknown kind, wrong
    /// payload shape, unusable username or room name.
    InvalidRequest,
    /// Anything but LOGIN before logging in.
    AuthRequired,
    /// Unknown room or player.
    NotFound,
    /// The request doesn't fit the current state.
    IllegalState,
    /// The rules refused a skill or phase change.
    Engine,
    /// Lost a race that someone else already won. Not reported.
    RaceBenign,
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NightfallError {
    /// A transport-level error (accept, send, recv, framing on the socket).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame that could not be decoded.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// A payload that doesn't match its kind.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (username, registry, outbox).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, invalid state, engine).
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("please login first")]
    NotLoggedIn,

    #[error("already logged in")]
    AlreadyLoggedIn,

    #[error("not in a room")]
    NoRoom,
}

impl NightfallError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::Framing(_) => ErrorCategory::Protocol,
            Self::Protocol(e) => protocol_category(e),
            Self::Session(e) => match e {
                SessionError::InvalidUsername(_) => ErrorCategory::InvalidRequest,
                SessionError::NotFound(_) => ErrorCategory::NotFound,
                SessionError::AlreadyRegistered(_) => ErrorCategory::IllegalState,
                SessionError::OutboxClosed
                | SessionError::SendTimeout(_)
                | SessionError::Framing(_) => ErrorCategory::Protocol,
            },
            Self::Room(e) => match e {
                RoomError::NotFound(_) => ErrorCategory::NotFound,
                RoomError::AlreadyStarted(_) => ErrorCategory::RaceBenign,
                RoomError::InvalidName(_) | RoomError::InvalidRoles(_) => {
                    ErrorCategory::InvalidRequest
                }
                RoomError::SkillNotAllowed(_)
                | RoomError::InvalidTarget(_)
                | RoomError::Engine(_) => ErrorCategory::Engine,
                RoomError::Protocol(e) => protocol_category(e),
                RoomError::RoomFull(_)
                | RoomError::RoomNotWaiting(_)
                | RoomError::AlreadyInRoom(..)
                | RoomError::NotInRoom(..)
                | RoomError::NotReady(_)
                | RoomError::CapacityMismatch { .. }
                | RoomError::GameNotRunning(_) => ErrorCategory::IllegalState,
            },
            Self::NotLoggedIn => ErrorCategory::AuthRequired,
            Self::AlreadyLoggedIn | Self::NoRoom => ErrorCategory::IllegalState,
        }
    }

    /// Whether the connection must be closed.
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Protocol
    }
}

fn protocol_category(e: &ProtocolError) -> ErrorCategory {
    match e {
        ProtocolError::InvalidPayload { .. } | ProtocolError::UnknownKind(_) => {
            ErrorCategory::InvalidRequest
        }
        // Our own payload failed to serialize; the connection can't be
        // trusted to carry anything further.
        ProtocolError::Encode(_) => ErrorCategory::Protocol,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nightfall_protocol::{PlayerId, RoomId, SkillType};
    use nightfall_room::EngineError;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ReceiveFailed(std::io::Error::other("gone"));
        let err: NightfallError = err.into();
        assert!(matches!(err, NightfallError::Transport(_)));
        assert!(err.to_string().contains("gone"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_framing_is_fatal() {
        let err: NightfallError = FramingError::TooLarge {
            len: 2 << 20,
            max: 1 << 20,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Protocol);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_unknown_kind_is_survivable() {
        let err: NightfallError = ProtocolError::UnknownKind("DANCE".into()).into();
        assert_eq!(err.category(), ErrorCategory::InvalidRequest);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_room_errors() {
        let room = RoomId::from("abcd1234");
        let cases = [
            (RoomError::NotFound(room.clone()), ErrorCategory::NotFound),
            (RoomError::RoomFull(room.clone()), ErrorCategory::IllegalState),
            (
                RoomError::RoomNotWaiting(room.clone()),
                ErrorCategory::IllegalState,
            ),
            (
                RoomError::AlreadyStarted(room.clone()),
                ErrorCategory::RaceBenign,
            ),
            (
                RoomError::SkillNotAllowed(SkillType::Kill),
                ErrorCategory::Engine,
            ),
            (
                RoomError::Engine(EngineError::GameOver),
                ErrorCategory::Engine,
            ),
            (
                RoomError::InvalidName("empty".into()),
                ErrorCategory::InvalidRequest,
            ),
        ];
        for (err, expected) in cases {
            let err: NightfallError = err.into();
            assert_eq!(err.category(), expected, "{err}");
            assert!(!err.is_fatal());
        }
    }

    #[test]
    fn test_session_errors() {
        let err: NightfallError = SessionError::InvalidUsername("empty".into()).into();
        assert_eq!(err.category(), ErrorCategory::InvalidRequest);

        let err: NightfallError = SessionError::NotFound(PlayerId::generate()).into();
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let err: NightfallError = SessionError::SendTimeout(Duration::from_secs(5)).into();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_login_gate_message() {
        let err = NightfallError::NotLoggedIn;
        assert_eq!(err.category(), ErrorCategory::AuthRequired);
        assert_eq!(err.to_string(), "please login first");
    }
}
