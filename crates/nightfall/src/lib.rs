//! # Nightfall
//!
//! Session and protocol gateway for multiplayer werewolf games.
//!
//! Nightfall accepts TCP clients speaking length-prefixed JSON frames,
//! authenticates them by username, groups them into rooms, and runs one
//! rules engine per room. The engine decides everything about the game;
//! Nightfall keeps each player's view private and consistent.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nightfall::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), NightfallError> {
//!     let server = NightfallServer::<ClassicEngine>::builder()
//!         .bind("127.0.0.1:8888")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod config;
mod dispatch;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::{ErrorCategory, NightfallError};
pub use server::{NightfallServer, NightfallServerBuilder};

pub mod prelude {
    pub use crate::{
        ErrorCategory, NightfallError, NightfallServer, NightfallServerBuilder, ServerConfig,
    };
    pub use nightfall_protocol::{
        Camp, Envelope, LENGTH_PREFIX_LEN, MAX_FRAME_SIZE, MessageKind, Phase, PlayerId,
        PlayerInfo, RoleType, RoomId, SkillType, WireCodec,
    };
    pub use nightfall_room::{GameEngine, RoomConfig};
    pub use nightfall_rules::ClassicEngine;
    pub use nightfall_session::SessionConfig;
}
