use std::time::Duration;

use crate::SessionError;

/// Configuration for player connections.
///
/// Sensible defaults are provided; override only the fields you care about:
///
/// ```rust
/// use nightfall_session::SessionConfig;
///
/// let config = SessionConfig {
///     outbox_capacity: 64,
///     ..SessionConfig::default()
/// };
/// assert_eq!(config.max_username_len, 32);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Frames a connection may have queued before senders start waiting.
    ///
    /// Default: 256.
    pub outbox_capacity: usize,

    /// Upper bound on one send: waiting for outbox space, plus waiting for
    /// the socket write acknowledgement on direct sends.
    ///
    /// Default: 5 seconds.
    pub send_timeout: Duration,

    /// Longest accepted display name, in characters.
    ///
    /// Default: 32.
    pub max_username_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            outbox_capacity: 256,
            send_timeout: Duration::from_secs(5),
            max_username_len: 32,
        }
    }
}

impl SessionConfig {
    /// Validates a claimed display name and returns it trimmed.
    ///
    /// Names are not unique and not verified; this only rejects names a
    /// terminal can't reasonably show.
    pub fn validate_username(&self, raw: &str) -> Result<String, SessionError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidUsername(
                "username must not be empty".into(),
            ));
        }
        if name.chars().count() > self.max_username_len {
            return Err(SessionError::InvalidUsername(format!(
                "username must be at most {} characters",
                self.max_username_len
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(SessionError::InvalidUsername(
                "username must not contain control characters".into(),
            ));
        }
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_trims() {
        let config = SessionConfig::default();
        assert_eq!(config.validate_username("  alice ").unwrap(), "alice");
    }

    #[test]
    fn test_validate_username_rejects_blank() {
        let config = SessionConfig::default();
        assert!(matches!(
            config.validate_username("   "),
            Err(SessionError::InvalidUsername(_))
        ));
    }

    #[test]
    fn test_validate_username_counts_chars_not_bytes() {
        let config = SessionConfig {
            max_username_len: 3,
            ..SessionConfig::default()
        };
        // Three characters, nine bytes.
        assert!(config.validate_username("狼狼狼").is_ok());
        assert!(config.validate_username("狼狼狼狼").is_err());
    }

    #[test]
    fn test_validate_username_rejects_control_chars() {
        let config = SessionConfig::default();
        assert!(config.validate_username("al\u{1b}[2Jice").is_err());
    }
}
