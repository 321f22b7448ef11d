//! Game model and rules.
//!
//! [`board`] and [`combat`] are pure data and rules. [`session`] and
//! [`registry`] hold live games, [`engine`] applies player actions, and
//! [`ticker`] drives troop generation.

pub mod board;
pub mod combat;
pub mod engine;
pub mod pause;
pub mod registry;
pub mod session;
pub mod ticker;

pub use board::{Board, Cell, Coord, GenerationParams, Team};
pub use combat::CombatOutcome;
pub use engine::{GameEngine, Joined, MoveStarted};
pub use registry::SessionRegistry;
pub use session::{ConnectionId, Move, MoveRequest, Player, Session, SessionKey, SessionSnapshot};
pub use ticker::Ticker;
