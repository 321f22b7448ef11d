//! Observability module.
//!
//! Logging and metrics infrastructure for monitoring running game sessions.

pub mod logging;
pub mod metrics;

pub use logging::{LogFormat, init_logging};
pub use metrics::init_metrics;
