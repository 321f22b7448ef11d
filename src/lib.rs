//! `GridClash` - real-time multiplayer territory game server
//!
//! This library provides the board model, combat rules, session engine and
//! HTTP/WebSocket transport behind the `gridclash` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod game;
pub mod observability;
pub mod protocol;
pub mod server;
pub mod transport;
