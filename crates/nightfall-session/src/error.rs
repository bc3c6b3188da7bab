//! Error types for the session layer.

use nightfall_protocol::{FramingError, PlayerId};

/// Errors that can occur while registering or messaging players.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The claimed display name was rejected.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// No player with this id is registered.
    #[error("player {0} not found")]
    NotFound(PlayerId),

    /// A player with this id is already registered.
    #[error("player {0} is already registered")]
    AlreadyRegistered(PlayerId),

    /// The player's writer task is gone, so nothing can reach them.
    #[error("outbox closed")]
    OutboxClosed,

    /// The outbox stayed full, or the socket write wasn't acknowledged,
    /// within the send timeout.
    #[error("send timed out after {0:?}")]
    SendTimeout(std::time::Duration),

    /// The envelope couldn't be turned into a frame.
    #[error(transparent)]
    Framing(#[from] FramingError),
}
