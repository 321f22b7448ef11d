//! Troop generation ticker.
//!
//! One process-wide task credits every generating spawn cell of every live
//! session once per interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::registry::SessionRegistry;
use crate::observability::metrics;

/// Periodic troop generation across all sessions.
pub struct Ticker;

impl Ticker {
    /// Starts the ticker task.
    ///
    /// The first tick fires one `period` after start. The task stops when
    /// `cancel` is cancelled.
    #[must_use]
    pub fn spawn(
        registry: Arc<SessionRegistry>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("ticker cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        tick_all(&registry).await;
                    }
                }
            }
        })
    }
}

/// Applies one tick to every live session.
///
/// Returns the number of sessions credited; paused and finished sessions
/// are skipped.
pub async fn tick_all(registry: &SessionRegistry) -> usize {
    let mut credited = 0;
    for session in registry.sessions() {
        if session.tick().await {
            credited += 1;
        }
    }
    trace!(sessions = credited, "tick");
    metrics::record_ticks(credited as u64);
    credited
}
