//! The envelope: the unit that travels inside one frame.
//!
//! On the wire every frame body is a JSON object with exactly three fields:
//!
//! ```json
//! {"type":"JOIN_ROOM","data":{"roomID":"3f2a9c01"},"timestamp":1718000000}
//! ```
//!
//! Decoding happens in two stages. The first stage (this module) reads the
//! header: the `type` tag, the timestamp, and `data` kept as *raw JSON*
//! ([`RawValue`]) without interpreting it. The second stage
//! ([`Envelope::decode_payload`]) parses `data` into the struct that matches
//! the tag. Keeping `data` raw means:
//!
//! 1. A payload of the wrong shape is a recoverable [`ProtocolError`], not a
//!    framing failure, because the header parsed fine.
//! 2. Re-encoding a decoded envelope reproduces the received frame byte
//!    for byte, with no float, key-order or whitespace drift.
//!
//! # Serialization cache
//!
//! Outbound envelopes are often broadcast to a whole room. [`Envelope::frame`]
//! serializes once and caches the finished frame in a [`OnceLock`]; every
//! later call is a cheap [`Bytes`] clone (a refcount bump, no copy).

use std::fmt;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, Bytes, BytesMut};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::codec::{LENGTH_PREFIX_LEN, MAX_FRAME_SIZE};
use crate::{FramingError, ProtocolError};

// ---------------------------------------------------------------------------
// MessageKind
// ---------------------------------------------------------------------------

/// The `type` tag of an envelope.
///
/// Tags we don't recognize are kept verbatim in [`MessageKind::Unknown`]
/// instead of failing the header decode. That way an unknown tag costs the
/// client an ERROR reply, not its connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    // Client → server
    Login,
    CreateRoom,
    JoinRoom,
    Ready,
    PerformAction,
    EndPhase,

    // Server → client
    LoginSuccess,
    RoomCreated,
    RoomJoined,
    PlayerJoined,
    PlayerLeft,
    PlayerReady,
    GameStarted,
    PhaseChanged,
    GameState,
    GameEvent,
    ActionResult,
    GameEnded,
    Error,
    RoleInfo,
    AllowedSkills,

    /// Any tag not listed above.
    Unknown(String),
}

impl MessageKind {
    /// The wire spelling of this tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Login => "LOGIN",
            Self::CreateRoom => "CREATE_ROOM",
            Self::JoinRoom => "JOIN_ROOM",
            Self::Ready => "READY",
            Self::PerformAction => "PERFORM_ACTION",
            Self::EndPhase => "END_PHASE",
            Self::LoginSuccess => "LOGIN_SUCCESS",
            Self::RoomCreated => "ROOM_CREATED",
            Self::RoomJoined => "ROOM_JOINED",
            Self::PlayerJoined => "PLAYER_JOINED",
            Self::PlayerLeft => "PLAYER_LEFT",
            Self::PlayerReady => "PLAYER_READY",
            Self::GameStarted => "GAME_STARTED",
            Self::PhaseChanged => "PHASE_CHANGED",
            Self::GameState => "GAME_STATE",
            Self::GameEvent => "GAME_EVENT",
            Self::ActionResult => "ACTION_RESULT",
            Self::GameEnded => "GAME_ENDED",
            Self::Error => "ERROR",
            Self::RoleInfo => "ROLE_INFO",
            Self::AllowedSkills => "ALLOWED_SKILLS",
            Self::Unknown(tag) => tag,
        }
    }

    /// Parses a wire tag. Never fails: unrecognized tags become `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "LOGIN" => Self::Login,
            "CREATE_ROOM" => Self::CreateRoom,
            "JOIN_ROOM" => Self::JoinRoom,
            "READY" => Self::Ready,
            "PERFORM_ACTION" => Self::PerformAction,
            "END_PHASE" => Self::EndPhase,
            "LOGIN_SUCCESS" => Self::LoginSuccess,
            "ROOM_CREATED" => Self::RoomCreated,
            "ROOM_JOINED" => Self::RoomJoined,
            "PLAYER_JOINED" => Self::PlayerJoined,
            "PLAYER_LEFT" => Self::PlayerLeft,
            "PLAYER_READY" => Self::PlayerReady,
            "GAME_STARTED" => Self::GameStarted,
            "PHASE_CHANGED" => Self::PhaseChanged,
            "GAME_STATE" => Self::GameState,
            "GAME_EVENT" => Self::GameEvent,
            "ACTION_RESULT" => Self::ActionResult,
            "GAME_ENDED" => Self::GameEnded,
            "ERROR" => Self::Error,
            "ROLE_INFO" => Self::RoleInfo,
            "ALLOWED_SKILLS" => Self::AllowedSkills,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = std::borrow::Cow::<'de, str>::deserialize(deserializer)?;
        if tag.is_empty() {
            return Err(de::Error::invalid_value(
                de::Unexpected::Str(""),
                &"a non-empty message type",
            ));
        }
        Ok(Self::from_tag(&tag))
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// A typed `data` body that knows its own tag.
///
/// Implemented by every message struct in this crate, which lets
/// [`Envelope::new`] fill in the `type` field automatically. You can't
/// accidentally send a `RoomJoined` body under a `ROOM_CREATED` tag.
pub trait Payload: Serialize {
    const KIND: MessageKind;
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// One protocol message: tag, raw JSON body and send time.
///
/// Immutable after construction. The only interior state is the frame cache,
/// which is filled at most once and never observable except as a speedup.
#[derive(Debug)]
pub struct Envelope {
    kind: MessageKind,
    data: Box<RawValue>,
    timestamp: i64,
    frame: OnceLock<Bytes>,
}

/// Outbound JSON body. Field order here is the field order on the wire.
#[derive(Serialize)]
struct WireBody<'a> {
    #[serde(rename = "type")]
    kind: &'a MessageKind,
    data: &'a RawValue,
    timestamp: i64,
}

#[derive(Deserialize)]
struct WireHeader {
    #[serde(rename = "type")]
    kind: MessageKind,
    #[serde(default)]
    data: Option<Box<RawValue>>,
    #[serde(default)]
    timestamp: i64,
}

impl Envelope {
    /// Builds an outbound envelope stamped with the current time.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the payload can't be serialized.
    pub fn new<P: Payload>(payload: &P) -> Result<Self, ProtocolError> {
        Self::with_timestamp(payload, now_epoch_secs())
    }

    /// Like [`Envelope::new`], with an explicit timestamp.
    pub fn with_timestamp<P: Payload>(
        payload: &P,
        timestamp: i64,
    ) -> Result<Self, ProtocolError> {
        let data = serde_json::value::to_raw_value(payload)
            .map_err(ProtocolError::Encode)?;
        Ok(Self::from_parts(P::KIND, data, timestamp))
    }

    pub(crate) fn from_parts(
        kind: MessageKind,
        data: Box<RawValue>,
        timestamp: i64,
    ) -> Self {
        Self {
            kind,
            data,
            timestamp,
            frame: OnceLock::new(),
        }
    }

    /// Parses a frame body (the bytes after the length prefix).
    ///
    /// The received bytes become the envelope's cached frame, so encoding a
    /// decoded envelope gives back exactly what arrived, whatever its key
    /// order or whitespace.
    pub(crate) fn from_body(body: &[u8]) -> Result<Self, FramingError> {
        if body.len() > MAX_FRAME_SIZE {
            return Err(FramingError::TooLarge {
                len: body.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        let header: WireHeader =
            serde_json::from_slice(body).map_err(FramingError::Malformed)?;
        let data = header.data.unwrap_or_else(|| RawValue::NULL.to_owned());
        let envelope = Self::from_parts(header.kind, data, header.timestamp);

        let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + body.len());
        buf.put_u32(body.len() as u32);
        buf.put_slice(body);
        let _ = envelope.frame.set(buf.freeze());
        Ok(envelope)
    }

    /// Serializes the JSON body (no length prefix).
    pub(crate) fn to_body(&self) -> Result<Vec<u8>, FramingError> {
        let body = WireBody {
            kind: &self.kind,
            data: &self.data,
            timestamp: self.timestamp,
        };
        serde_json::to_vec(&body).map_err(FramingError::Encode)
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// The raw `data` JSON, exactly as received or encoded.
    pub fn data(&self) -> &RawValue {
        &self.data
    }

    /// Send time in seconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Second-stage decode: parses `data` as the payload type `P`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidPayload`] when `data` doesn't match
    /// the shape of `P`. The connection survives this.
    pub fn decode_payload<P: DeserializeOwned>(&self) -> Result<P, ProtocolError> {
        serde_json::from_str(self.data.get()).map_err(|source| {
            ProtocolError::InvalidPayload {
                kind: self.kind.to_string(),
                source,
            }
        })
    }

    /// The complete wire frame: length prefix plus JSON body.
    ///
    /// Computed on first call and cached, so broadcasting one envelope to N
    /// recipients serializes it once.
    ///
    /// # Errors
    /// [`FramingError::TooLarge`] if the body exceeds the frame ceiling.
    pub fn frame(&self) -> Result<Bytes, FramingError> {
        if let Some(frame) = self.frame.get() {
            return Ok(frame.clone());
        }

        let body = self.to_body()?;
        if body.len() > MAX_FRAME_SIZE {
            return Err(FramingError::TooLarge {
                len: body.len(),
                max: MAX_FRAME_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + body.len());
        // Fits: body.len() <= MAX_FRAME_SIZE < u32::MAX.
        buf.put_u32(body.len() as u32);
        buf.put_slice(&body);
        let frame = buf.freeze();

        // Losing a race here just means another caller cached an identical
        // frame first.
        let _ = self.frame.set(frame.clone());
        Ok(frame)
    }
}

impl Clone for Envelope {
    fn clone(&self) -> Self {
        let frame = OnceLock::new();
        if let Some(cached) = self.frame.get() {
            let _ = frame.set(cached.clone());
        }
        Self {
            kind: self.kind.clone(),
            data: self.data.clone(),
            timestamp: self.timestamp,
            frame,
        }
    }
}

/// Equality ignores the frame cache.
impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.data.get() == other.data.get()
            && self.timestamp == other.timestamp
    }
}

impl Eq for Envelope {}

fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JoinRoom, LoginSuccess, PlayerId, RoomId};

    #[test]
    fn test_kind_tags_round_trip() {
        for tag in ["LOGIN", "GAME_STATE", "ALLOWED_SKILLS", "ERROR"] {
            assert_eq!(MessageKind::from_tag(tag).as_str(), tag);
        }
    }

    #[test]
    fn test_unknown_tag_is_preserved() {
        let kind = MessageKind::from_tag("TELEPORT");
        assert_eq!(kind, MessageKind::Unknown("TELEPORT".into()));
        assert_eq!(kind.to_string(), "TELEPORT");
    }

    #[test]
    fn test_new_fills_in_kind_from_payload() {
        let env = Envelope::new(&LoginSuccess {
            player_id: PlayerId::generate(),
        })
        .unwrap();
        assert_eq!(env.kind(), &MessageKind::LoginSuccess);
        assert!(env.timestamp() > 0);
    }

    #[test]
    fn test_body_field_order_is_type_data_timestamp() {
        let env = Envelope::with_timestamp(
            &JoinRoom {
                room_id: RoomId::from("abcd1234"),
            },
            1_700_000_000,
        )
        .unwrap();
        let body = String::from_utf8(env.to_body().unwrap()).unwrap();
        assert_eq!(
            body,
            r#"{"type":"JOIN_ROOM","data":{"roomID":"abcd1234"},"timestamp":1700000000}"#
        );
    }

    #[test]
    fn test_frame_is_cached() {
        let env = Envelope::new(&LoginSuccess {
            player_id: PlayerId::generate(),
        })
        .unwrap();
        let first = env.frame().unwrap();
        let second = env.frame().unwrap();
        // Same allocation, not just equal contents.
        assert_eq!(first.as_ptr(), second.as_ptr());
    }

    #[test]
    fn test_missing_data_decodes_as_null() {
        let env = Envelope::from_body(br#"{"type":"READY","timestamp":5}"#).unwrap();
        assert_eq!(env.kind(), &MessageKind::Ready);
        assert_eq!(env.data().get(), "null");
    }

    #[test]
    fn test_decode_payload_reports_kind_on_shape_mismatch() {
        let env =
            Envelope::from_body(br#"{"type":"JOIN_ROOM","data":{"room":1},"timestamp":5}"#)
                .unwrap();
        let err = env.decode_payload::<JoinRoom>().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { ref kind, .. } if kind == "JOIN_ROOM"));
    }

    #[test]
    fn test_empty_type_is_malformed() {
        let result = Envelope::from_body(br#"{"type":"","data":{},"timestamp":5}"#);
        assert!(matches!(result, Err(FramingError::Malformed(_))));
    }
}
