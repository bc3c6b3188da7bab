//! Player connection state for Nightfall.
//!
//! This crate handles everything between "a socket exists" and "a room
//! wants to talk to someone":
//!
//! 1. **Identity** — a claimed display name, validated by [`SessionConfig`]
//! 2. **Outbound delivery** — a bounded [`Outbox`] per connection, drained
//!    by the [`deliver`] writer task, with direct (acknowledged) sends
//! 3. **Registry** — every logged-in [`Player`] in a [`PlayerRegistry`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← holds Player clones in rosters and sends to them
//!     ↕
//! Session Layer (this crate)  ← player identity and outbound queues
//!     ↕
//! Transport / Protocol (below)  ← connections, envelopes, frames
//! ```

mod config;
mod error;
mod outbox;
mod player;
mod registry;

pub use config::SessionConfig;
pub use error::SessionError;
pub use outbox::{Outbound, Outbox, OutboxReceiver, deliver};
pub use player::Player;
pub use registry::{PlayerEntry, PlayerRegistry};
