//! Metrics collection.
//!
//! Provides Prometheus-compatible metrics and typed convenience functions
//! for recording measurements. Label values only ever come from closed
//! enums; session keys and player names are never used as labels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{GridClashError, MoveRejection};
use crate::game::combat::CombatOutcome;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `GridClashError::Io` if the recorder or HTTP listener
/// cannot be installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), GridClashError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| GridClashError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "gridclash_moves_submitted_total",
        "Total number of moves accepted for travel"
    );
    describe_counter!(
        "gridclash_moves_rejected_total",
        "Total number of moves rejected at submission, by reason"
    );
    describe_counter!(
        "gridclash_moves_resolved_total",
        "Total number of moves that landed, by combat outcome"
    );
    describe_counter!(
        "gridclash_cascades_total",
        "Home-corner captures that handed a whole team over"
    );
    describe_counter!(
        "gridclash_ticks_total",
        "Troop-generation ticks applied to a session"
    );
    describe_counter!("gridclash_sessions_created_total", "Sessions created");
    describe_counter!("gridclash_sessions_finished_total", "Sessions terminated");
    describe_gauge!("gridclash_sessions_active", "Sessions currently registered");
    describe_gauge!(
        "gridclash_connections_active",
        "Number of currently open WebSocket connections"
    );
    describe_histogram!(
        "gridclash_move_delay_ms",
        "Travel time assigned to accepted moves in milliseconds"
    );
}

/// Records an accepted move and its travel time.
pub fn record_move_submitted(delay: Duration) {
    counter!("gridclash_moves_submitted_total").increment(1);
    histogram!("gridclash_move_delay_ms").record(delay.as_secs_f64() * 1000.0);
}

/// Records a rejected move.
pub fn record_move_rejected(rejection: &MoveRejection) {
    counter!("gridclash_moves_rejected_total", "reason" => rejection.label()).increment(1);
}

/// Records a landed move, including any cascade it triggered.
pub fn record_move_resolved(outcome: &CombatOutcome) {
    counter!("gridclash_moves_resolved_total", "outcome" => outcome.label()).increment(1);
    if matches!(outcome, CombatOutcome::Captured { cascaded, .. } if *cascaded > 0) {
        counter!("gridclash_cascades_total").increment(1);
    }
}

/// Records `sessions` ticked sessions.
pub fn record_ticks(sessions: u64) {
    counter!("gridclash_ticks_total").increment(sessions);
}

/// Records a newly created session.
pub fn record_session_created() {
    counter!("gridclash_sessions_created_total").increment(1);
}

/// Records a terminated session.
pub fn record_session_finished() {
    counter!("gridclash_sessions_finished_total").increment(1);
}

/// Sets the number of registered sessions.
#[allow(clippy::cast_precision_loss)]
pub fn set_sessions_active(count: usize) {
    gauge!("gridclash_sessions_active").set(count as f64);
}

/// Records an opened connection.
pub fn connection_opened() {
    gauge!("gridclash_connections_active").increment(1.0);
}

/// Records a closed connection.
pub fn connection_closed() {
    gauge!("gridclash_connections_active").decrement(1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Team;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        // metrics macros silently no-op when no global recorder is installed
        record_move_submitted(Duration::from_millis(1500));
        record_move_rejected(&MoveRejection::Paused);
        record_move_resolved(&CombatOutcome::Claimed);
        record_move_resolved(&CombatOutcome::Captured {
            defeated: Team::Blue,
            cascaded: 4,
        });
        record_ticks(3);
        record_session_created();
        record_session_finished();
        set_sessions_active(2);
        connection_opened();
        connection_closed();
    }
}
