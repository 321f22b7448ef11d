//! Move resolution engine.
//!
//! The engine is the single entry point for player actions. Accepted moves
//! leave their source cell immediately and land after a travel delay
//! proportional to the distance covered. Each in-flight move is its own
//! task; landing order therefore follows timer expiry rather than
//! submission order.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::board::Team;
use super::combat;
use super::session::{
    ConnectionId, Move, MoveRecord, MoveRequest, Player, Session, SessionKey, SessionSnapshot,
};
use super::registry::SessionRegistry;
use crate::config::TimingConfig;
use crate::error::MoveRejection;
use crate::observability::metrics;
use crate::protocol::ServerEvent;

/// Result of joining a session.
#[derive(Debug)]
pub struct Joined {
    /// The joined session.
    pub session: Arc<Session>,
    /// State at the moment of joining, for the joining connection only.
    pub snapshot: SessionSnapshot,
    /// Audience events published after `snapshot`.
    pub events: broadcast::Receiver<ServerEvent>,
}

/// An accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveStarted {
    /// Identifier carried by the matching `start_move` and `end_move`.
    pub move_id: String,
    /// Travel time until the move lands.
    pub delay: Duration,
}

/// A move in flight, waiting for its timer.
#[derive(Debug)]
struct PendingMove {
    movement: Move,
    submitted_at: DateTime<Utc>,
}

/// Applies player actions to sessions.
#[derive(Debug, Clone)]
pub struct GameEngine {
    registry: Arc<SessionRegistry>,
    timing: TimingConfig,
}

impl GameEngine {
    /// Creates an engine over `registry`.
    #[must_use]
    pub const fn new(registry: Arc<SessionRegistry>, timing: TimingConfig) -> Self {
        Self { registry, timing }
    }

    /// The registry this engine acts on.
    #[must_use]
    pub const fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Timing in effect.
    #[must_use]
    pub const fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Joins `connection` to the session under `key`, creating it if needed.
    ///
    /// Joining again re-registers the player with the new name and team.
    pub async fn join(
        &self,
        key: &SessionKey,
        connection: ConnectionId,
        name: String,
        team: Team,
    ) -> Joined {
        loop {
            let session = self.registry.get_or_create(key);
            let player = Player {
                name: name.clone(),
                team,
            };
            if let Some((snapshot, events)) = session.add_player(connection, player).await {
                return Joined {
                    session,
                    snapshot,
                    events,
                };
            }
            // Terminated between lookup and join. The registry entry is
            // already gone, so the next pass starts a fresh session.
            debug!(session = %key, %connection, "joined a finishing session, retrying");
        }
    }

    /// Audience subscription for an existing session.
    #[must_use]
    pub fn subscribe(&self, key: &SessionKey) -> Option<broadcast::Receiver<ServerEvent>> {
        self.registry.lookup(key).map(|session| session.subscribe())
    }

    /// Validates and launches a move.
    ///
    /// # Errors
    ///
    /// Returns the first [`MoveRejection`] that applies. Checks run in
    /// order: session exists, not paused, known player, team matches,
    /// coordinates on the board, neither cell inert. A rejected move never
    /// touches the board.
    pub async fn submit_move(
        &self,
        key: &SessionKey,
        connection: ConnectionId,
        request: MoveRequest,
    ) -> Result<MoveStarted, MoveRejection> {
        let result = self.launch(key, connection, request).await;
        match &result {
            Ok(started) => {
                debug!(
                    session = %key,
                    %connection,
                    move_id = %started.move_id,
                    delay = ?started.delay,
                    "move accepted"
                );
                metrics::record_move_submitted(started.delay);
            }
            Err(rejection) => {
                debug!(
                    session = %key,
                    %connection,
                    reason = rejection.label(),
                    "move rejected: {rejection}"
                );
                metrics::record_move_rejected(rejection);
            }
        }
        result
    }

    async fn launch(
        &self,
        key: &SessionKey,
        connection: ConnectionId,
        request: MoveRequest,
    ) -> Result<MoveStarted, MoveRejection> {
        let not_found = || MoveRejection::SessionNotFound(key.to_string());
        let session = self.registry.lookup(key).ok_or_else(not_found)?;

        let mut state = session.lock().await;
        if state.finished {
            return Err(not_found());
        }
        if state.is_paused {
            return Err(MoveRejection::Paused);
        }
        let assigned = state
            .players
            .get(&connection)
            .map(|player| player.team)
            .ok_or(MoveRejection::UnknownPlayer)?;
        if assigned != request.team {
            return Err(MoveRejection::TeamMismatch {
                declared: request.team,
                assigned,
            });
        }
        for coord in [request.from, request.to] {
            let cell = state.board.get(coord).ok_or(MoveRejection::OutOfBounds {
                row: coord.row,
                col: coord.col,
            })?;
            if cell.is_inert() {
                return Err(MoveRejection::InertCell {
                    row: coord.row,
                    col: coord.col,
                });
            }
        }

        if let Some(source) = state.board.get_mut(request.from) {
            source.troops = 0;
        }

        let delay = self.timing.travel_time(request.from, request.to);
        let movement = Move {
            id: Uuid::new_v4().to_string(),
            from: request.from,
            to: request.to,
            troops: request.troops,
            team: request.team,
        };
        let started = MoveStarted {
            move_id: movement.id.clone(),
            delay,
        };
        session.broadcast(ServerEvent::StartMove {
            movement: movement.clone(),
            duration: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        });
        drop(state);

        let pending = PendingMove {
            movement,
            submitted_at: Utc::now(),
        };
        tokio::spawn(resolve_after(session, pending, delay));
        Ok(started)
    }

    /// Flips the pause flag of the session under `key`.
    ///
    /// Returns the new flag, or `None` if no live session has that key.
    pub async fn toggle_pause(&self, key: &SessionKey) -> Option<bool> {
        let session = self.registry.lookup(key)?;
        session.toggle_pause().await
    }

    /// Terminates the session under `key`; returns whether one existed.
    pub async fn finish(&self, key: &SessionKey) -> bool {
        self.registry.terminate(key).await.is_some()
    }

    /// Removes `connection` from every session it joined.
    ///
    /// Returns the number of sessions it was removed from.
    pub async fn disconnect(&self, connection: ConnectionId) -> usize {
        let mut removed = 0;
        for session in self.registry.sessions() {
            if session.remove_player(connection).await {
                removed += 1;
            }
        }
        removed
    }
}

/// Waits out the travel delay, then lands the move.
///
/// A move that comes due while the session is paused waits for the resume
/// and lands exactly once afterwards. Termination aborts it silently.
async fn resolve_after(session: Arc<Session>, pending: PendingMove, delay: Duration) {
    let cancel = session.cancellation().clone();
    let move_id = pending.movement.id.clone();

    tokio::select! {
        () = cancel.cancelled() => {
            debug!(session = %session.key(), %move_id, "move aborted, session finished");
            return;
        }
        () = tokio::time::sleep(delay) => {}
    }

    loop {
        let mut state = session.lock().await;
        if state.finished {
            debug!(session = %session.key(), %move_id, "move aborted, session finished");
            return;
        }

        if state.is_paused {
            // Subscribed under the lock; a resume cannot slip past.
            let mut watcher = session.pause_gate().watch();
            drop(state);
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(session = %session.key(), %move_id, "move aborted while paused");
                    return;
                }
                () = watcher.wait_until_resumed() => {}
            }
            continue;
        }

        let movement = &pending.movement;
        let Some(outcome) =
            combat::resolve(&mut state.board, movement.to, movement.team, movement.troops)
        else {
            warn!(session = %session.key(), %move_id, "move target left the board");
            return;
        };

        state.moves.push(MoveRecord {
            movement: pending.movement,
            submitted_at: pending.submitted_at,
            resolved_at: Utc::now(),
            outcome,
        });
        session.broadcast(ServerEvent::EndMove {
            move_id: move_id.clone(),
            state: state.snapshot(),
        });
        drop(state);

        info!(
            session = %session.key(),
            %move_id,
            outcome = outcome.label(),
            "move resolved"
        );
        metrics::record_move_resolved(&outcome);
        return;
    }
}
