//! Server configuration.

use nightfall_room::RoomConfig;
use nightfall_session::SessionConfig;

/// Everything a server needs before it binds.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,

    /// Consecutive failed requests after which a connection is closed.
    /// Any successful request resets the count.
    pub error_threshold: u32,

    pub session: SessionConfig,

    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8888".to_string(),
            error_threshold: 16,
            session: SessionConfig::default(),
            room: RoomConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:8888");
        assert_eq!(config.error_threshold, 16);
        assert_eq!(config.room.default_roles.len(), 6);
    }
}
