//! Server runtime.
//!
//! [`GameServer`] wires the session registry, the game engine, the troop
//! ticker and the HTTP/WebSocket transport together under one cancellation
//! token.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::GridClashError;
use crate::game::engine::GameEngine;
use crate::game::registry::SessionRegistry;
use crate::game::ticker::Ticker;
use crate::transport::http::{AppState, HttpServer, parse_bind_addr};

/// A running game server.
#[derive(Debug)]
pub struct GameServer {
    engine: GameEngine,
    http: HttpServer,
    ticker: JoinHandle<()>,
    cancel: CancellationToken,
}

impl GameServer {
    /// Binds the listener and starts the ticker.
    ///
    /// Everything stops when `cancel` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the bind address is invalid or cannot
    /// be bound.
    pub async fn start(
        config: &EngineConfig,
        cancel: CancellationToken,
    ) -> Result<Self, GridClashError> {
        let bind_addr = parse_bind_addr(&config.server.bind)?;

        let registry = Arc::new(SessionRegistry::new(config.board.clone()));
        let engine = GameEngine::new(Arc::clone(&registry), config.timing);
        let state = Arc::new(AppState::new(engine.clone(), cancel.clone()));
        let http = HttpServer::bind(&bind_addr, state, cancel.clone()).await?;

        let ticker = Ticker::spawn(registry, config.timing.tick_interval, cancel.clone());

        info!(
            addr = %http.local_addr(),
            board_size = config.board.size,
            tick_interval = ?config.timing.tick_interval,
            time_per_cell = ?config.timing.time_per_cell,
            "game server started"
        );

        Ok(Self {
            engine,
            http,
            ticker,
            cancel,
        })
    }

    /// Address the HTTP listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.http.local_addr()
    }

    /// The engine serving this server's players.
    #[must_use]
    pub const fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// Runs until the cancellation token fires, then waits for the listener
    /// and ticker to stop.
    pub async fn run(self) {
        self.cancel.cancelled().await;
        debug!("shutdown requested");

        self.http.wait().await;
        let _ = self.ticker.await;

        let sessions = self.engine.registry().len();
        info!(sessions, "game server stopped");
    }
}
