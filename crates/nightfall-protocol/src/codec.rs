//! Length-prefixed framing.
//!
//! TCP is a byte stream, not a message stream: one `read()` can return half
//! a message or three messages glued together. Framing puts the boundaries
//! back. Every frame is
//!
//! ```text
//! ┌────────────────────┬──────────────────────────────────────┐
//! │ length: u32 (BE)   │ body: `length` bytes of JSON envelope │
//! └────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! The length prefix is read and checked against [`MAX_FRAME_SIZE`] *before*
//! any of the body is read or buffered. A peer announcing a 4 GiB frame is
//! rejected after 4 bytes, not after we've tried to allocate 4 GiB.
//!
//! [`WireCodec`] is stateless and purely functional. The transport layer
//! uses [`WireCodec::read_length`] and [`WireCodec::decode_body`] while
//! streaming; [`WireCodec::decode`] handles a complete frame held in memory.

use bytes::Bytes;

use crate::{Envelope, FramingError};

/// Size of the big-endian length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest accepted frame body: 1 MiB.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Encoder/decoder for the `[u32 length][JSON]` frame format.
///
/// ## Example
///
/// ```rust
/// use nightfall_protocol::{Envelope, LoginSuccess, PlayerId, WireCodec};
///
/// let envelope = Envelope::new(&LoginSuccess { player_id: PlayerId::generate() }).unwrap();
///
/// let frame = WireCodec::encode(&envelope).unwrap();
/// let decoded = WireCodec::decode(&frame).unwrap();
///
/// assert_eq!(envelope, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WireCodec;

impl WireCodec {
    /// Encodes an envelope into a complete frame.
    ///
    /// Delegates to the envelope's cached frame, so encoding the same
    /// envelope twice serializes it once.
    pub fn encode(envelope: &Envelope) -> Result<Bytes, FramingError> {
        envelope.frame()
    }

    /// Decodes exactly one complete frame.
    ///
    /// # Errors
    /// - [`FramingError::Truncated`] if the prefix or body is incomplete.
    /// - [`FramingError::TooLarge`] if the prefix exceeds the ceiling; the
    ///   body is never looked at.
    /// - [`FramingError::TrailingBytes`] if bytes follow the frame.
    /// - [`FramingError::Malformed`] if the body isn't an envelope.
    pub fn decode(frame: &[u8]) -> Result<Envelope, FramingError> {
        let Some((prefix, rest)) = frame.split_first_chunk::<LENGTH_PREFIX_LEN>() else {
            return Err(FramingError::Truncated {
                expected: LENGTH_PREFIX_LEN,
                actual: frame.len(),
            });
        };

        let len = Self::read_length(*prefix)?;
        if rest.len() < len {
            return Err(FramingError::Truncated {
                expected: len,
                actual: rest.len(),
            });
        }
        if rest.len() > len {
            return Err(FramingError::TrailingBytes {
                extra: rest.len() - len,
            });
        }

        Self::decode_body(rest)
    }

    /// Interprets a length prefix, enforcing the frame ceiling.
    pub fn read_length(prefix: [u8; LENGTH_PREFIX_LEN]) -> Result<usize, FramingError> {
        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_FRAME_SIZE {
            return Err(FramingError::TooLarge {
                len,
                max: MAX_FRAME_SIZE,
            });
        }
        Ok(len)
    }

    /// Decodes a frame body (everything after the length prefix).
    pub fn decode_body(body: &[u8]) -> Result<Envelope, FramingError> {
        Envelope::from_body(body)
    }
}
