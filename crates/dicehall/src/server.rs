//! `DicehallServer` builder and accept loop.
//!
//! Ties the layers together: transport → gateway → engine.

use std::sync::Arc;

use dicehall_dice::{HouseLedger, OutcomeSource, PayoutExecutor, RandomOutcomes};
use dicehall_protocol::{Codec, JsonCodec};
use dicehall_room::{EngineHandle, RoomConfig, spawn_engine};
use dicehall_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{DicehallError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) engine: EngineHandle,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a dicehall server.
///
/// Defaults: random outcomes and an in-memory [`HouseLedger`] holding
/// the default house balance.
///
/// ```rust,ignore
/// let server = DicehallServer::builder()
///     .bind("0.0.0.0:3000")
///     .room_config(RoomConfig { betting_window_secs: 30, ..Default::default() })
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct DicehallServerBuilder<S = RandomOutcomes, E = HouseLedger> {
    bind_addr: String,
    room_config: RoomConfig,
    source: S,
    executor: Arc<E>,
}

impl DicehallServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default())
    }

    /// Creates a builder from loaded configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            bind_addr: config.listen_addr.clone(),
            room_config: config.room.clone(),
            source: RandomOutcomes,
            executor: Arc::new(HouseLedger::with_reserve(
                config.house_balance,
                config.house_reserve,
            )),
        }
    }
}

impl Default for DicehallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: OutcomeSource, E: PayoutExecutor> DicehallServerBuilder<S, E> {
    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every room runs with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Replaces the source of dice outcomes.
    pub fn outcome_source<S2: OutcomeSource>(self, source: S2) -> DicehallServerBuilder<S2, E> {
        DicehallServerBuilder {
            bind_addr: self.bind_addr,
            room_config: self.room_config,
            source,
            executor: self.executor,
        }
    }

    /// Replaces the payout executor.
    pub fn executor<E2: PayoutExecutor>(self, executor: Arc<E2>) -> DicehallServerBuilder<S, E2> {
        DicehallServerBuilder {
            bind_addr: self.bind_addr,
            room_config: self.room_config,
            source: self.source,
            executor,
        }
    }

    /// Binds the listener and starts the room engine.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<DicehallServer<JsonCodec>, DicehallError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let engine = spawn_engine(self.room_config, self.source, self.executor);

        let state = Arc::new(ServerState {
            engine,
            codec: JsonCodec,
        });
        Ok(DicehallServer { transport, state })
    }
}

/// A bound dicehall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct DicehallServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl DicehallServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> DicehallServerBuilder {
        DicehallServerBuilder::new()
    }
}

impl<C: Codec> DicehallServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the room engine, for queries from outside a connection.
    pub fn engine(&self) -> EngineHandle {
        self.state.engine.clone()
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task for each connection. Runs until the process
    /// is terminated.
    pub async fn run(mut self) -> Result<(), DicehallError> {
        tracing::info!(addr = ?self.local_addr().ok(), "dicehall server running");

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
