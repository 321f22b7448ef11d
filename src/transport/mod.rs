//! Network transport.
//!
//! Players reach the engine over HTTP and WebSocket through one axum router.
//! See [`http`] for the routes and listener and [`ws`] for the per-socket
//! protocol loop.

pub mod http;
pub mod ws;

pub use http::{AppState, HttpServer, build_router, parse_bind_addr};
pub use ws::Connection;

use crate::error::TransportError;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
