//! `NightfallServer` builder and server loop.
//!
//! This is the entry point for running a Nightfall game server. It ties
//! together all the layers: transport → protocol → session → room.

use std::marker::PhantomData;
use std::net::SocketAddr;
use std::sync::Arc;

use nightfall_room::{GameEngine, RoomConfig, RoomRegistry};
use nightfall_session::{PlayerRegistry, SessionConfig};
use nightfall_transport::{TcpTransport, Transport};
use tokio::sync::RwLock;

use crate::handler::handle_connection;
use crate::{NightfallError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. When both
/// registries are needed the player registry is locked first.
pub(crate) struct ServerState<E: GameEngine> {
    pub(crate) players: RwLock<PlayerRegistry>,
    pub(crate) rooms: RwLock<RoomRegistry<E>>,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Nightfall server.
///
/// # Example
///
/// ```rust,no_run
/// use nightfall::prelude::*;
///
/// # async fn run() -> Result<(), NightfallError> {
/// let server = NightfallServer::<ClassicEngine>::builder()
///     .bind("0.0.0.0:8888")
///     .error_threshold(8)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct NightfallServerBuilder<E: GameEngine> {
    config: ServerConfig,
    _engine: PhantomData<fn() -> E>,
}

impl<E: GameEngine> NightfallServerBuilder<E> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            _engine: PhantomData,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how many failed requests in a row close a connection.
    pub fn error_threshold(mut self, threshold: u32) -> Self {
        self.config.error_threshold = threshold;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<NightfallServer<E>, NightfallError> {
        let transport = TcpTransport::bind(self.config.bind_addr.as_str()).await?;

        let state = Arc::new(ServerState {
            players: RwLock::new(PlayerRegistry::new()),
            rooms: RwLock::new(RoomRegistry::new(self.config.room.clone())),
            config: self.config,
        });

        Ok(NightfallServer { transport, state })
    }
}

impl<E: GameEngine> Default for NightfallServerBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Nightfall game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct NightfallServer<E: GameEngine> {
    transport: TcpTransport,
    state: Arc<ServerState<E>>,
}

impl<E: GameEngine> NightfallServer<E> {
    /// Creates a new builder.
    pub fn builder() -> NightfallServerBuilder<E> {
        NightfallServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NightfallError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until the
    /// process is terminated; a failed accept is logged and skipped.
    pub async fn run(mut self) -> Result<(), NightfallError> {
        tracing::info!(addr = %self.local_addr()?, "Nightfall server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
