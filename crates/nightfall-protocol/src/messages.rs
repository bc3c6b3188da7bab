//! Typed payloads: the second stage of decoding.
//!
//! One struct per message kind. Each implements [`Payload`] so it can be
//! wrapped into an [`Envelope`] with the right tag. Field names follow the
//! wire's camelCase (`roomID`, `isReady`, ...) through explicit renames; the
//! Rust side stays snake_case.
//!
//! Inbound messages are parsed through [`InboundMessage::parse`], which is
//! the only place that decides which tags a client may send.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::envelope::{Envelope, MessageKind, Payload};
use crate::types::{Camp, Phase, PlayerId, PlayerInfo, RoleType, RoomId, SkillType};
use crate::ProtocolError;

// ===========================================================================
// Client → server
// ===========================================================================

/// `LOGIN`: claims a display name. No password, no identity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    pub username: String,
}

/// `CREATE_ROOM`: a room name plus the role slots that define capacity.
///
/// An empty or missing `roles` list means "use the default table".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoom {
    #[serde(rename = "roomName")]
    pub room_name: String,
    #[serde(default)]
    pub roles: Vec<RoleType>,
}

/// `JOIN_ROOM`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoom {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
}

/// `READY`: toggles the sender's ready flag. Carries no fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ready {}

/// `PERFORM_ACTION`: one skill, at most one target.
///
/// Terminal clients send `"targetID": ""` for targetless skills, so an
/// empty string is read as "no target".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformAction {
    #[serde(rename = "skillType")]
    pub skill_type: SkillType,
    #[serde(
        rename = "targetID",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_id: Option<PlayerId>,
}

/// `END_PHASE`: asks the engine to close the current phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndPhase {}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<PlayerId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse().map(Some).map_err(de::Error::custom),
    }
}

/// A decoded client request, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Login(Login),
    CreateRoom(CreateRoom),
    JoinRoom(JoinRoom),
    Ready,
    PerformAction(PerformAction),
    EndPhase,
}

impl InboundMessage {
    /// Second-stage decode of a client envelope.
    ///
    /// `READY` and `END_PHASE` ignore their body entirely, so `{}`, `null`
    /// and a missing `data` are all accepted.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownKind`] for tags that aren't client requests
    ///   (including server-only tags like `GAME_STATE`).
    /// - [`ProtocolError::InvalidPayload`] for a known tag with a body of
    ///   the wrong shape.
    pub fn parse(envelope: &Envelope) -> Result<Self, ProtocolError> {
        match envelope.kind() {
            MessageKind::Login => envelope.decode_payload().map(Self::Login),
            MessageKind::CreateRoom => envelope.decode_payload().map(Self::CreateRoom),
            MessageKind::JoinRoom => envelope.decode_payload().map(Self::JoinRoom),
            MessageKind::Ready => Ok(Self::Ready),
            MessageKind::PerformAction => {
                envelope.decode_payload().map(Self::PerformAction)
            }
            MessageKind::EndPhase => Ok(Self::EndPhase),
            other => Err(ProtocolError::UnknownKind(other.to_string())),
        }
    }

    /// The tag this message arrived under.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Login(_) => MessageKind::Login,
            Self::CreateRoom(_) => MessageKind::CreateRoom,
            Self::JoinRoom(_) => MessageKind::JoinRoom,
            Self::Ready => MessageKind::Ready,
            Self::PerformAction(_) => MessageKind::PerformAction,
            Self::EndPhase => MessageKind::EndPhase,
        }
    }
}

// ===========================================================================
// Server → client
// ===========================================================================

/// `LOGIN_SUCCESS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSuccess {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
}

/// `ROOM_CREATED`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCreated {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
}

/// `ROOM_JOINED`: sent to the joiner with the full member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomJoined {
    #[serde(rename = "roomID")]
    pub room_id: RoomId,
    pub players: Vec<PlayerInfo>,
}

/// `PLAYER_JOINED`: sent to the members already in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJoined {
    pub player: PlayerInfo,
}

/// `PLAYER_LEFT`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLeft {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
}

/// `PLAYER_READY`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReady {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "isReady")]
    pub is_ready: bool,
}

/// `GAME_STARTED`: private to each player, carrying only their own role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStarted {
    #[serde(rename = "roleType")]
    pub role_type: RoleType,
    pub camp: Camp,
    pub players: Vec<PlayerInfo>,
}

/// `PHASE_CHANGED`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChanged {
    pub phase: Phase,
    pub round: u32,
}

/// `GAME_STATE`: the public snapshot. Never reveals roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: Phase,
    pub round: u32,
    pub players: Vec<PlayerInfo>,
    #[serde(rename = "alivePlayers")]
    pub alive_players: Vec<PlayerId>,
    #[serde(rename = "isEnded")]
    pub is_ended: bool,
}

/// Event categories carried by `GAME_EVENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventType {
    PlayerDied,
}

/// `GAME_EVENT`: a public announcement, e.g. a death.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    #[serde(rename = "eventType")]
    pub event_type: GameEventType,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// `ACTION_RESULT`: the outcome of one request, sent only to its sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// `GAME_ENDED`: the winner and a full role reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnded {
    pub winner: Camp,
    pub players: Vec<PlayerInfo>,
}

/// `ERROR`: a request failed; the connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What a `ROLE_INFO` message is telling its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleInfoType {
    /// Werewolves learn each other at game start.
    Teammates,
    /// The witch learns the night's victim.
    KillTarget,
}

/// `ROLE_INFO`: role-scoped private knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    #[serde(rename = "infoType")]
    pub info_type: RoleInfoType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teammates: Option<Vec<PlayerInfo>>,
    #[serde(
        rename = "killTargetID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kill_target_id: Option<PlayerId>,
    #[serde(
        rename = "killTargetName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub kill_target_name: Option<String>,
}

impl RoleInfo {
    pub fn teammates(teammates: Vec<PlayerInfo>) -> Self {
        Self {
            info_type: RoleInfoType::Teammates,
            teammates: Some(teammates),
            kill_target_id: None,
            kill_target_name: None,
        }
    }

    pub fn kill_target(id: PlayerId, name: String) -> Self {
        Self {
            info_type: RoleInfoType::KillTarget,
            teammates: None,
            kill_target_id: Some(id),
            kill_target_name: Some(name),
        }
    }
}

/// `ALLOWED_SKILLS`: what the recipient may do in the phase just entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedSkills {
    pub skills: Vec<SkillType>,
}

// ---------------------------------------------------------------------------
// Payload impls
// ---------------------------------------------------------------------------

macro_rules! impl_payload {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(impl Payload for $ty {
            const KIND: MessageKind = MessageKind::$kind;
        })*
    };
}

impl_payload! {
    Login => Login,
    CreateRoom => CreateRoom,
    JoinRoom => JoinRoom,
    Ready => Ready,
    PerformAction => PerformAction,
    EndPhase => EndPhase,
    LoginSuccess => LoginSuccess,
    RoomCreated => RoomCreated,
    RoomJoined => RoomJoined,
    PlayerJoined => PlayerJoined,
    PlayerLeft => PlayerLeft,
    PlayerReady => PlayerReady,
    GameStarted => GameStarted,
    PhaseChanged => PhaseChanged,
    GameState => GameState,
    GameEvent => GameEvent,
    ActionResult => ActionResult,
    GameEnded => GameEnded,
    ErrorMessage => Error,
    RoleInfo => RoleInfo,
    AllowedSkills => AllowedSkills,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(body: &str) -> Envelope {
        Envelope::from_body(body.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_login() {
        let env = envelope(r#"{"type":"LOGIN","data":{"username":"alice"},"timestamp":1}"#);
        assert_eq!(
            InboundMessage::parse(&env).unwrap(),
            InboundMessage::Login(Login {
                username: "alice".into()
            })
        );
    }

    #[test]
    fn test_create_room_without_roles_leaves_list_empty() {
        let env = envelope(
            r#"{"type":"CREATE_ROOM","data":{"roomName":"den"},"timestamp":1}"#,
        );
        match InboundMessage::parse(&env).unwrap() {
            InboundMessage::CreateRoom(req) => {
                assert_eq!(req.room_name, "den");
                assert!(req.roles.is_empty());
            }
            other => panic!("expected CreateRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_ready_ignores_body() {
        for body in [
            r#"{"type":"READY","data":{},"timestamp":1}"#,
            r#"{"type":"READY","data":null,"timestamp":1}"#,
            r#"{"type":"READY","timestamp":1}"#,
        ] {
            assert_eq!(InboundMessage::parse(&envelope(body)).unwrap(), InboundMessage::Ready);
        }
    }

    #[test]
    fn test_perform_action_empty_target_is_none() {
        let env = envelope(
            r#"{"type":"PERFORM_ACTION","data":{"skillType":"speak","targetID":""},"timestamp":1}"#,
        );
        match InboundMessage::parse(&env).unwrap() {
            InboundMessage::PerformAction(action) => {
                assert_eq!(action.skill_type, SkillType::Speak);
                assert_eq!(action.target_id, None);
            }
            other => panic!("expected PerformAction, got {other:?}"),
        }
    }

    #[test]
    fn test_perform_action_bad_target_is_invalid_payload() {
        let env = envelope(
            r#"{"type":"PERFORM_ACTION","data":{"skillType":"kill","targetID":"nope"},"timestamp":1}"#,
        );
        assert!(matches!(
            InboundMessage::parse(&env),
            Err(ProtocolError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_unknown_skill_is_invalid_payload() {
        let env = envelope(
            r#"{"type":"PERFORM_ACTION","data":{"skillType":"fly"},"timestamp":1}"#,
        );
        assert!(matches!(
            InboundMessage::parse(&env),
            Err(ProtocolError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_server_only_kind_is_rejected_inbound() {
        let env = envelope(r#"{"type":"GAME_STATE","data":{},"timestamp":1}"#);
        assert!(matches!(
            InboundMessage::parse(&env),
            Err(ProtocolError::UnknownKind(kind)) if kind == "GAME_STATE"
        ));
    }

    #[test]
    fn test_role_info_kill_target_wire_shape() {
        let id = PlayerId::generate();
        let json = serde_json::to_value(RoleInfo::kill_target(id, "bob".into())).unwrap();
        assert_eq!(json["infoType"], "kill_target");
        assert_eq!(json["killTargetID"], id.to_string());
        assert_eq!(json["killTargetName"], "bob");
        assert!(json.get("teammates").is_none());
    }

    #[test]
    fn test_error_message_uses_error_tag() {
        let env = Envelope::new(&ErrorMessage::new("please login first")).unwrap();
        assert_eq!(env.kind(), &MessageKind::Error);
        assert_eq!(env.data().get(), r#"{"message":"please login first"}"#);
    }
}
