//! Session registry.
//!
//! Maps session keys to live sessions. Lookups never block each other; the
//! first access to an unknown key creates exactly one session even when many
//! connections race for it.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use super::board::{Board, GenerationParams};
use super::session::{Session, SessionKey};
use crate::observability::metrics;

/// All live sessions, keyed by session key.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: DashMap<SessionKey, Arc<Session>>,
    params: GenerationParams,
}

impl SessionRegistry {
    /// Creates an empty registry whose new sessions use `params`.
    #[must_use]
    pub fn new(params: GenerationParams) -> Self {
        Self {
            sessions: DashMap::new(),
            params,
        }
    }

    /// Returns the session for `key`, generating a board for it if absent.
    pub fn get_or_create(&self, key: &SessionKey) -> Arc<Session> {
        if let Some(existing) = self.sessions.get(key) {
            return Arc::clone(existing.value());
        }

        let mut created = false;
        let session = Arc::clone(
            self.sessions
                .entry(key.clone())
                .or_insert_with(|| {
                    created = true;
                    let board = Board::generate(&self.params, &mut rand::rng());
                    Arc::new(Session::new(key.clone(), board))
                })
                .value(),
        );

        if created {
            info!(session = %key, size = self.params.size, "session created");
            metrics::record_session_created();
            metrics::set_sessions_active(self.sessions.len());
        }
        session
    }

    /// Returns the session for `key` without creating it.
    #[must_use]
    pub fn lookup(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.sessions.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes the session for `key` and finishes it.
    ///
    /// Pending resolutions for the session abort. A later `get_or_create`
    /// with the same key starts a fresh game.
    pub async fn terminate(&self, key: &SessionKey) -> Option<Arc<Session>> {
        let (_, session) = self.sessions.remove(key)?;
        session.finish().await;
        metrics::record_session_finished();
        metrics::set_sessions_active(self.sessions.len());
        Some(session)
    }

    /// Snapshot of the currently registered sessions.
    #[must_use]
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Parameters used to generate new boards.
    #[must_use]
    pub const fn params(&self) -> &GenerationParams {
        &self.params
    }
}
