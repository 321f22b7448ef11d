//! Game sessions.
//!
//! A [`Session`] owns one board, its roster and its resolved-move log behind
//! a single async mutex. Every read-modify-write of the board (ticks, move
//! submission, move resolution) happens with that lock held, and events that
//! describe the mutation are published to the session's audience before the
//! lock is released so subscribers see them in mutation order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::board::{Board, Coord, Team};
use super::combat::CombatOutcome;
use super::pause::PauseGate;
use crate::protocol::ServerEvent;

/// Buffered audience events per subscriber before it starts lagging.
pub const AUDIENCE_CAPACITY: usize = 128;

// ============================================================================
// Identifiers
// ============================================================================

/// Transport-assigned identity of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The bare key players share to reach the same game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    /// Wraps a key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Players and moves
// ============================================================================

/// A connected client that joined a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    /// Display name chosen on join.
    pub name: String,
    /// Team the player acts for.
    pub team: Team,
}

/// A move as submitted by a client, before the engine assigns an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MoveRequest {
    /// Source cell.
    pub from: Coord,
    /// Destination cell.
    pub to: Coord,
    /// Troops sent.
    pub troops: u32,
    /// Team the client claims to act for.
    pub team: Team,
}

/// An accepted move. `id` correlates the start and end broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Move {
    /// Engine-assigned identifier.
    pub id: String,
    /// Source cell.
    pub from: Coord,
    /// Destination cell.
    pub to: Coord,
    /// Troops sent.
    pub troops: u32,
    /// Acting team.
    pub team: Team,
}

/// A resolved move in the session's audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    /// The move that landed.
    #[serde(flatten)]
    pub movement: Move,
    /// When the move was accepted.
    pub submitted_at: DateTime<Utc>,
    /// When the move landed.
    pub resolved_at: DateTime<Utc>,
    /// Combat result at landing time.
    pub outcome: CombatOutcome,
}

// ============================================================================
// State
// ============================================================================

/// Mutable state guarded by the session lock.
#[derive(Debug)]
pub struct SessionState {
    /// The board.
    pub board: Board,
    /// Joined players by connection.
    pub players: BTreeMap<ConnectionId, Player>,
    /// Resolved moves in landing order. Write-only for the engine.
    pub moves: Vec<MoveRecord>,
    /// Whether ticks and resolutions are suspended.
    pub is_paused: bool,
    /// Set once the session has been terminated.
    pub finished: bool,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    /// Full client-facing view of this state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board.clone(),
            players: self.players.clone(),
            moves: self.moves.clone(),
            is_paused: self.is_paused,
            created_at: self.created_at,
        }
    }
}

/// Serializable copy of a session's state sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Board as rows of cells.
    pub board: Board,
    /// Players by connection id.
    pub players: BTreeMap<ConnectionId, Player>,
    /// Resolved move log.
    pub moves: Vec<MoveRecord>,
    /// Pause flag.
    pub is_paused: bool,
    /// Session creation time.
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Session
// ============================================================================

/// One independent game.
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    state: Mutex<SessionState>,
    pause: PauseGate,
    audience: broadcast::Sender<ServerEvent>,
    cancel: CancellationToken,
}

impl Session {
    /// Creates an unpaused session with no players around `board`.
    #[must_use]
    pub fn new(key: SessionKey, board: Board) -> Self {
        let (audience, _) = broadcast::channel(AUDIENCE_CAPACITY);
        Self {
            key,
            state: Mutex::new(SessionState {
                board,
                players: BTreeMap::new(),
                moves: Vec::new(),
                is_paused: false,
                finished: false,
                created_at: Utc::now(),
            }),
            pause: PauseGate::new(),
            audience,
            cancel: CancellationToken::new(),
        }
    }

    /// Session key.
    #[must_use]
    pub const fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Acquires the session lock.
    pub async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Token cancelled when the session is terminated.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Pause gate mirrored from `is_paused`.
    #[must_use]
    pub const fn pause_gate(&self) -> &PauseGate {
        &self.pause
    }

    /// Subscribes to this session's audience events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.audience.subscribe()
    }

    /// Publishes an event to every subscriber.
    ///
    /// Call with the session lock held when the event describes a mutation.
    pub fn broadcast(&self, event: ServerEvent) {
        // No subscribers is fine; nobody is watching this session.
        let _ = self.audience.send(event);
    }

    /// Full snapshot of the current state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.lock().await.snapshot()
    }

    /// Registers (or re-registers) a player.
    ///
    /// Returns the snapshot for that player together with an audience
    /// subscription taken under the same lock, so the subscriber sees every
    /// event after the snapshot. Returns `None` if the session has finished.
    pub async fn add_player(
        &self,
        connection: ConnectionId,
        player: Player,
    ) -> Option<(SessionSnapshot, broadcast::Receiver<ServerEvent>)> {
        let mut state = self.lock().await;
        if state.finished {
            return None;
        }
        info!(
            session = %self.key,
            %connection,
            name = %player.name,
            team = %player.team,
            "player joined"
        );
        state.players.insert(connection, player);
        Some((state.snapshot(), self.subscribe()))
    }

    /// Removes a player and broadcasts the updated state.
    ///
    /// Returns `false` if the connection was not a player here.
    pub async fn remove_player(&self, connection: ConnectionId) -> bool {
        let mut state = self.lock().await;
        if state.players.remove(&connection).is_none() {
            return false;
        }
        debug!(session = %self.key, %connection, "player left");
        if !state.finished {
            self.broadcast(ServerEvent::GameState(state.snapshot()));
        }
        true
    }

    /// Flips the pause flag and announces it.
    ///
    /// Returns the new flag, or `None` if the session has finished.
    pub async fn toggle_pause(&self) -> Option<bool> {
        let mut state = self.lock().await;
        if state.finished {
            return None;
        }
        state.is_paused = !state.is_paused;
        self.pause.set(state.is_paused);
        self.broadcast(ServerEvent::PauseState {
            is_paused: state.is_paused,
        });
        info!(session = %self.key, paused = state.is_paused, "pause toggled");
        Some(state.is_paused)
    }

    /// Credits one troop to every generating spawn and broadcasts the state.
    ///
    /// Paused and finished sessions are skipped; skipped ticks are lost.
    /// Returns whether the session was credited.
    pub async fn tick(&self) -> bool {
        let mut state = self.lock().await;
        if state.is_paused || state.finished {
            return false;
        }
        for cell in state.board.cells_mut().filter(|c| c.generates_troops()) {
            cell.troops = cell.troops.saturating_add(1);
        }
        self.broadcast(ServerEvent::GameState(state.snapshot()));
        true
    }

    /// Marks the session finished, announces it, and cancels pending work.
    ///
    /// Idempotent.
    pub async fn finish(&self) {
        let mut state = self.lock().await;
        if state.finished {
            return;
        }
        state.finished = true;
        self.broadcast(ServerEvent::GameFinished {
            game_key: self.key.to_string(),
        });
        self.cancel.cancel();
        info!(
            session = %self.key,
            moves = state.moves.len(),
            "session finished"
        );
    }
}
