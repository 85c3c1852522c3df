// # Debouncer
//
// One cancelable "fire after delay" slot per field. Arming replaces any
// pending value and deadline, so timers never stack.

use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Debounce timer for a single field
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(Instant, String)>,
}

impl Debouncer {
    /// Create an idle debouncer with the given quiet period
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// (Re)arm the timer for `value`, replacing whatever was pending
    pub fn arm(&mut self, value: impl Into<String>) {
        self.pending = Some((Instant::now() + self.delay, value.into()));
    }

    /// Drop the pending value without firing
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value settles, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    /// Wait for the pending value to settle and take it
    ///
    /// Never resolves while the debouncer is idle. Cancel-safe: dropping the
    /// future before the deadline leaves the pending value in place.
    pub async fn settled(&mut self) -> String {
        let Some(deadline) = self.deadline() else {
            return std::future::pending().await;
        };

        sleep_until(deadline).await;

        match self.pending.take() {
            Some((_, value)) => value,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));
        let start = Instant::now();

        debouncer.arm("Berlin");
        let value = debouncer.settled().await;

        assert_eq!(value, "Berlin");
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(!debouncer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_pending_value() {
        let mut debouncer = Debouncer::new(Duration::from_millis(1000));

        debouncer.arm("Ber");
        tokio::time::advance(Duration::from_millis(600)).await;
        debouncer.arm("Berlin");

        // The first deadline passes without firing
        let early = tokio::time::timeout(Duration::from_millis(500), debouncer.settled()).await;
        assert!(early.is_err());
        assert!(debouncer.is_armed());

        assert_eq!(debouncer.settled().await, "Berlin");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        debouncer.arm("10115");
        debouncer.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), debouncer.settled()).await;
        assert!(result.is_err());
    }
}
