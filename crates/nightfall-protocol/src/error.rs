//! Error types for the protocol layer.
//!
//! There are two enums here because there are two very different kinds of
//! failure:
//!
//! - [`FramingError`] means the byte stream itself is broken (bad length
//!   prefix, oversized frame, body that isn't an envelope). Once framing is
//!   lost there is no way to find the start of the next frame, so these are
//!   fatal for the connection.
//! - [`ProtocolError`] means a well-framed envelope carried something we
//!   can't act on (unknown kind, payload of the wrong shape). The stream is
//!   still in sync, so the connection survives and the client gets an ERROR.

/// A well-framed envelope whose content can't be used.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an outbound payload failed.
    ///
    /// Practically unreachable for our payload types (plain structs with
    /// string keys), but `serde_json` reports it through a `Result`, so we
    /// surface it instead of panicking.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The `data` body didn't match the schema for its `type`.
    ///
    /// `kind` is kept as a string so the message can name what the client
    /// sent, e.g. "invalid JOIN_ROOM payload: missing field `roomID`".
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// The `type` tag isn't one a client is allowed to send.
    #[error("unknown message type: {0}")]
    UnknownKind(String),
}

/// The byte stream can't be split into envelopes.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// The length prefix declares more than the frame ceiling.
    ///
    /// Raised from the prefix alone, before a single body byte is read.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    TooLarge { len: usize, max: usize },

    /// Fewer bytes were available than the frame requires.
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Bytes were left over after a complete frame.
    #[error("{extra} trailing bytes after frame")]
    TrailingBytes { extra: usize },

    /// The body isn't a `{type, data, timestamp}` JSON object.
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Serializing an outbound envelope failed.
    #[error("envelope encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}
