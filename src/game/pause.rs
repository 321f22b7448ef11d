//! Pause gate shared by a session and its pending move resolutions.
//!
//! The session's `is_paused` flag is authoritative and lives under the
//! session lock. The gate mirrors it on a `watch` channel so a resolution
//! that comes due while paused can park until the flag clears instead of
//! re-checking on a timer. The mirror is only written while the session lock
//! is held, so a watcher subscribed under the lock never misses a resume.

use tokio::sync::watch;

/// Broadcasts pause/resume transitions to parked resolution tasks.
#[derive(Debug)]
pub struct PauseGate {
    tx: watch::Sender<bool>,
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseGate {
    /// Creates an unpaused gate.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Publishes the new pause flag.
    pub fn set(&self, paused: bool) {
        self.tx.send_replace(paused);
    }

    /// Current mirrored flag.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.tx.borrow()
    }

    /// Returns a watcher that observes future transitions.
    #[must_use]
    pub fn watch(&self) -> PauseWatcher {
        PauseWatcher {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving half of a [`PauseGate`].
#[derive(Debug)]
pub struct PauseWatcher {
    rx: watch::Receiver<bool>,
}

impl PauseWatcher {
    /// Resolves once the gate reports unpaused. Returns immediately if it
    /// already does.
    pub async fn wait_until_resumed(&mut self) {
        // The sender lives as long as the session; an error means the
        // session is gone and the caller re-checks state anyway.
        let _ = self.rx.wait_for(|paused| !*paused).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn resumed_returns_immediately_when_unpaused() {
        let gate = PauseGate::new();
        let mut watcher = gate.watch();
        tokio::time::timeout(Duration::from_millis(50), watcher.wait_until_resumed())
            .await
            .expect("unpaused gate should not block");
    }

    #[tokio::test]
    async fn resumed_waits_for_unpause() {
        let gate = PauseGate::new();
        gate.set(true);
        assert!(gate.is_paused());

        let mut watcher = gate.watch();
        let waiter = tokio::spawn(async move { watcher.wait_until_resumed().await });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        gate.set(false);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake on resume")
            .unwrap();
    }
}
