//! Wire protocol for Nightfall.
//!
//! This crate defines the "language" that terminal clients and the gateway
//! speak:
//!
//! - **Types** ([`PlayerId`], [`RoomId`], [`RoleType`], [`Phase`], ...) —
//!   identifiers and the game vocabulary shared with the rules engine.
//! - **Envelope** ([`Envelope`], [`MessageKind`]) — the framed unit on the
//!   wire: a kind tag, a kind-specific `data` body and a timestamp.
//! - **Messages** ([`InboundMessage`] and one struct per payload) — the
//!   strongly typed second stage of decoding.
//! - **Codec** ([`WireCodec`]) — length-prefixed framing with a 1 MiB ceiling.
//! - **Errors** ([`ProtocolError`], [`FramingError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (Envelope → InboundMessage) → Dispatcher
//! ```
//!
//! The protocol layer knows nothing about connections or rooms.

mod codec;
mod envelope;
mod error;
mod messages;
mod types;

pub use codec::{LENGTH_PREFIX_LEN, MAX_FRAME_SIZE, WireCodec};
pub use envelope::{Envelope, MessageKind, Payload};
pub use error::{FramingError, ProtocolError};
pub use messages::{
    ActionResult, AllowedSkills, CreateRoom, EndPhase, ErrorMessage,
    GameEnded, GameEvent, GameEventType, GameStarted, GameState,
    InboundMessage, JoinRoom, Login, LoginSuccess, PerformAction,
    PhaseChanged, PlayerJoined, PlayerLeft, PlayerReady, Ready, RoleInfo,
    RoleInfoType, RoomCreated, RoomJoined,
};
pub use types::{Camp, Phase, PlayerId, PlayerInfo, RoleType, RoomId, SkillType};
