//! HTTP transport.
//!
//! Serves the welcome page, session readiness checks, a liveness probe and
//! the WebSocket upgrade endpoint players connect through.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use rand::seq::IndexedRandom;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Result, ws};
use crate::error::TransportError;
use crate::game::engine::GameEngine;
use crate::game::session::{ConnectionId, SessionKey};

/// Word list the welcome page draws suggested session keys from.
pub const SUGGESTED_KEYS: [&str; 10] = [
    "apple", "banana", "cherry", "dragon", "eagle", "falcon", "grape", "honey", "igloo", "jungle",
];

/// Number of keys suggested per page load.
const SUGGESTION_COUNT: usize = 5;

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
    engine: GameEngine,
    next_connection_id: AtomicU64,
    cancel: CancellationToken,
}

impl AppState {
    /// Creates handler state around `engine`. Open sockets close when
    /// `cancel` fires.
    #[must_use]
    pub const fn new(engine: GameEngine, cancel: CancellationToken) -> Self {
        Self {
            engine,
            next_connection_id: AtomicU64::new(1),
            cancel,
        }
    }

    /// The game engine.
    #[must_use]
    pub const fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// Shutdown token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Allocates the id for a new connection.
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }
}

/// A bound, running HTTP server.
#[derive(Debug)]
pub struct HttpServer {
    handle: JoinHandle<()>,
    local_addr: SocketAddr,
}

impl HttpServer {
    /// Binds `bind_addr` and starts serving.
    ///
    /// Returns once the listener is bound, so binding port 0 reports the
    /// actual port through [`local_addr`](Self::local_addr).
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the TCP listener cannot bind.
    pub async fn bind(
        bind_addr: &str,
        state: Arc<AppState>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("bind failed: {e}")))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::ConnectionFailed(format!("local_addr failed: {e}")))?;

        let router = build_router(state);
        let handle = tokio::spawn(async move {
            info!(%local_addr, "HTTP server listening");
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel.cancelled().await;
                })
                .await
                .ok();
            debug!("HTTP server shut down");
        });

        Ok(Self { handle, local_addr })
    }

    /// Address the listener is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the server to finish after its token is cancelled.
    pub async fn wait(self) {
        let _ = self.handle.await;
    }
}

// ============================================================================
// Axum Router
// ============================================================================

/// Builds the router: `/`, `/healthz`, `/ws` and `/{key}`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_welcome))
        .route("/healthz", get(handle_health))
        .route("/ws", get(ws::ws_handler))
        .route("/{key}", get(handle_session))
        .with_state(state)
}

/// `GET /` handler: rules and a handful of suggested session keys.
async fn handle_welcome(State(state): State<Arc<AppState>>) -> Html<String> {
    let size = state.engine.registry().params().size;
    let keys: Vec<&str> = SUGGESTED_KEYS
        .choose_multiple(&mut rand::rng(), SUGGESTION_COUNT)
        .copied()
        .collect();
    Html(render_welcome(size, &keys))
}

fn render_welcome(size: usize, keys: &[&str]) -> String {
    let mut html = format!(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="UTF-8">
    <title>Grid Clash</title>
  </head>
  <body>
    <h1>Welcome to Grid Clash!</h1>
    <p><strong>Rules:</strong></p>
    <ul>
      <li>The board is {size}x{size} with a home spawn in each corner.</li>
      <li>Grey spawns generate troops only after they are conquered.</li>
      <li>Select a cell with troops, then a destination cell, to send your troops.</li>
      <li>Troops travel one cell per time unit; farther targets take longer.</li>
      <li>Conquering a cell turns it your color.</li>
      <li>Conquering an enemy's home corner hands you every cell that team owns.</li>
      <li>All players join using the same game key. Pick one color and stick to it.</li>
    </ul>
    <p>Choose a game below (refresh for new keys):</p>
    <ul>
"#
    );
    for key in keys {
        let _ = writeln!(html, r#"      <li><a href="/{key}">{key}</a></li>"#);
    }
    html.push_str("    </ul>\n  </body>\n</html>\n");
    html
}

/// `GET /healthz` handler.
async fn handle_health() -> &'static str {
    "ok"
}

/// `GET /{key}` handler: creates the session if needed and reports it ready.
async fn handle_session(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Response {
    let key = key.trim();
    if key.is_empty() {
        return (StatusCode::BAD_REQUEST, "game key must not be empty").into_response();
    }
    let key = SessionKey::new(key);
    let existed = state.engine.registry().lookup(&key).is_some();
    state.engine.registry().get_or_create(&key);
    debug!(session = %key, reused = existed, "session requested over HTTP");
    format!("Game '{key}' is ready. Connect to /ws and join with game_key \"{key}\".")
        .into_response()
}

// ============================================================================
// Helpers
// ============================================================================

/// Parses a bind address string into a full `host:port` form.
///
/// Accepts:
/// - `:5001` → `0.0.0.0:5001`
/// - `5001` → `0.0.0.0:5001`
/// - `1.2.3.4:5001` → as-is
///
/// # Errors
///
/// Returns [`TransportError::ConnectionFailed`] if the result cannot be
/// parsed as a valid socket address.
pub fn parse_bind_addr(input: &str) -> Result<String> {
    let input = input.trim();
    let addr = if input.starts_with(':') {
        format!("0.0.0.0{input}")
    } else if input.parse::<u16>().is_ok() {
        format!("0.0.0.0:{input}")
    } else {
        input.to_string()
    };
    addr.parse::<SocketAddr>().map_err(|e| {
        TransportError::ConnectionFailed(format!("invalid bind address \"{input}\": {e}"))
    })?;
    Ok(addr)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::game::board::GenerationParams;
    use crate::game::registry::SessionRegistry;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let registry = Arc::new(SessionRegistry::new(GenerationParams {
            size: 8,
            ..GenerationParams::default()
        }));
        Arc::new(AppState::new(
            GameEngine::new(registry, TimingConfig::default()),
            CancellationToken::new(),
        ))
    }

    async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = build_router(state).oneshot(req).await.unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    // ------------------------------------------------------------------
    // parse_bind_addr
    // ------------------------------------------------------------------

    #[test]
    fn parse_bind_addr_forms() {
        assert_eq!(parse_bind_addr(":5001").unwrap(), "0.0.0.0:5001");
        assert_eq!(parse_bind_addr("5001").unwrap(), "0.0.0.0:5001");
        assert_eq!(parse_bind_addr("127.0.0.1:3000").unwrap(), "127.0.0.1:3000");
    }

    #[test]
    fn parse_bind_addr_invalid() {
        assert!(parse_bind_addr("not-an-address").is_err());
    }

    // ------------------------------------------------------------------
    // Routes
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn welcome_lists_five_distinct_keys() {
        let (status, body) = get(test_state(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("8x8"));

        let linked: Vec<_> = SUGGESTED_KEYS
            .iter()
            .filter(|key| body.contains(&format!(r#"href="/{key}""#)))
            .collect();
        assert_eq!(linked.len(), SUGGESTION_COUNT);
    }

    #[tokio::test]
    async fn session_route_creates_then_reuses() {
        let state = test_state();
        let (status, body) = get(Arc::clone(&state), "/apple").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Game 'apple' is ready"));

        let key = SessionKey::from("apple");
        let first = state.engine().registry().lookup(&key).unwrap();
        get(Arc::clone(&state), "/apple").await;
        let second = state.engine().registry().lookup(&key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(state.engine().registry().len(), 1);
    }

    #[tokio::test]
    async fn healthz_is_ok_and_creates_nothing() {
        let state = test_state();
        let (status, body) = get(Arc::clone(&state), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
        assert!(state.engine().registry().is_empty());
    }

    #[tokio::test]
    async fn ws_route_requires_upgrade() {
        let (status, _) = get(test_state(), "/ws").await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn bind_reports_local_addr_and_shuts_down() {
        let cancel = CancellationToken::new();
        let server = HttpServer::bind("127.0.0.1:0", test_state(), cancel.clone())
            .await
            .unwrap();
        assert_ne!(server.local_addr().port(), 0);
        cancel.cancel();
        server.wait().await;
    }

    #[test]
    fn connection_ids_are_unique() {
        let state = test_state();
        let a = state.next_connection_id();
        let b = state.next_connection_id();
        assert_ne!(a, b);
    }
}
