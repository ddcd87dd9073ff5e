//! Cancellable silence debounce timer.

use std::time::Duration;
use tokio::time::Instant;

/// One-shot timer owned by the session driver's event loop.
///
/// The turn controller commands it via `ArmSilence`/`CancelSilence` actions;
/// each arm restarts the full window. While disarmed, `elapsed()` never
/// completes, which makes the timer safe to poll unconditionally inside a
/// `select!` loop.
#[derive(Debug)]
pub struct DebounceTimer {
    window: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    /// Creates a disarmed timer with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Arms (or re-arms) the timer for a full window from now.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    /// Cancels the pending deadline, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns true if a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Completes when the armed window elapses; pends forever while disarmed.
    ///
    /// The caller must `cancel()` or re-`arm()` after this fires: the
    /// deadline is not cleared automatically.
    pub async fn elapsed(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_window() {
        let mut timer = DebounceTimer::new(Duration::from_millis(2000));
        timer.arm();

        let before = Instant::now();
        timer.elapsed().await;
        assert!(before.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_full_window() {
        let mut timer = DebounceTimer::new(Duration::from_millis(2000));
        timer.arm();

        tokio::time::advance(Duration::from_millis(1500)).await;
        timer.arm();

        // 600ms after the re-arm: original deadline has passed, new one not
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(
            tokio::time::timeout(Duration::from_millis(0), timer.elapsed())
                .await
                .is_err(),
            "timer fired before the re-armed window elapsed"
        );

        tokio::time::advance(Duration::from_millis(1400)).await;
        assert!(
            tokio::time::timeout(Duration::from_millis(0), timer.elapsed())
                .await
                .is_ok()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_timer_never_fires() {
        let timer = DebounceTimer::new(Duration::from_millis(10));
        let fired = tokio::time::timeout(Duration::from_secs(60), timer.elapsed()).await;
        assert!(fired.is_err(), "disarmed timer should pend forever");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_disarms() {
        let mut timer = DebounceTimer::new(Duration::from_millis(100));
        timer.arm();
        assert!(timer.is_armed());

        timer.cancel();
        assert!(!timer.is_armed());

        let fired = tokio::time::timeout(Duration::from_secs(1), timer.elapsed()).await;
        assert!(fired.is_err());
    }
}
