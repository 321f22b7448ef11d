//! Wire messages exchanged with browser clients.
//!
//! Both directions are closed, tagged enums. Inbound frames that do not match
//! a known variant with all required fields are rejected at the boundary.

use serde::{Deserialize, Serialize};

use crate::game::board::{Coord, Team};
use crate::game::session::{Move, MoveRequest, SessionKey, SessionSnapshot};

fn default_player_name() -> String {
    "Anonymous".to_string()
}

/// A client action. Tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join (creating if needed) a session.
    JoinGame {
        /// Session key.
        game_key: String,
        /// Display name.
        #[serde(default = "default_player_name")]
        player_name: String,
        /// Team to play for.
        team: Team,
    },
    /// Send troops from one cell to another.
    Move {
        /// Session key.
        game_key: String,
        /// Source cell.
        from: Coord,
        /// Destination cell.
        to: Coord,
        /// Troops sent.
        troops: u32,
        /// Team the move is made for.
        team: Team,
    },
    /// Pause or resume the session.
    TogglePause {
        /// Session key.
        game_key: String,
    },
    /// End the session for everyone.
    FinishGame {
        /// Session key.
        game_key: String,
    },
}

impl ClientMessage {
    /// Session key named by the message.
    #[must_use]
    pub fn game_key(&self) -> SessionKey {
        match self {
            Self::JoinGame { game_key, .. }
            | Self::Move { game_key, .. }
            | Self::TogglePause { game_key }
            | Self::FinishGame { game_key } => SessionKey::new(game_key.trim()),
        }
    }

    /// Move payload for a `move` message.
    #[must_use]
    pub fn move_request(&self) -> Option<MoveRequest> {
        match *self {
            Self::Move {
                from,
                to,
                troops,
                team,
                ..
            } => Some(MoveRequest {
                from,
                to,
                troops,
                team,
            }),
            _ => None,
        }
    }
}

/// An event sent to clients. Tagged by `"event"` with the payload in `"data"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full session state.
    GameState(SessionSnapshot),
    /// A move was accepted and is in flight.
    StartMove {
        /// The accepted move.
        #[serde(rename = "move")]
        movement: Move,
        /// Travel time in milliseconds.
        duration: u64,
    },
    /// A move landed.
    EndMove {
        /// Id from the matching `start_move`.
        move_id: String,
        /// Session state after resolution.
        state: SessionSnapshot,
    },
    /// Pause flag changed.
    PauseState {
        /// New flag.
        #[serde(rename = "isPaused")]
        is_paused: bool,
    },
    /// The session was terminated.
    GameFinished {
        /// Key of the finished session.
        game_key: String,
    },
    /// A move from this connection was not accepted.
    MoveRejected {
        /// Stable machine-readable code.
        code: String,
        /// Human-readable reason.
        reason: String,
    },
    /// A malformed or unserviceable request from this connection.
    Error {
        /// Description.
        message: String,
    },
}

impl ServerEvent {
    /// Wire name of this event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GameState(_) => "game_state",
            Self::StartMove { .. } => "start_move",
            Self::EndMove { .. } => "end_move",
            Self::PauseState { .. } => "pause_state",
            Self::GameFinished { .. } => "game_finished",
            Self::MoveRejected { .. } => "move_rejected",
            Self::Error { .. } => "error",
        }
    }
}
