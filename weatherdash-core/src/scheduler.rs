//! Periodic refresh timer.
//!
//! At most one timer is live: [`RefreshScheduler::start`] cancels whatever
//! was running before arming a new one.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Sent to the dashboard every time the refresh interval elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTick;

#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    ticks: mpsc::UnboundedSender<RefreshTick>,
    active: Option<CancellationToken>,
}

impl RefreshScheduler {
    pub fn new(interval: Duration, ticks: mpsc::UnboundedSender<RefreshTick>) -> Self {
        Self {
            interval,
            ticks,
            active: None,
        }
    }

    /// Scheduler plus the receiving end of its ticks.
    pub fn channel(interval: Duration) -> (Self, mpsc::UnboundedReceiver<RefreshTick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(interval, tx), rx)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cancel any running timer and arm a fresh one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        self.cancel();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let ticks = self.ticks.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        tracing::debug!("refresh interval elapsed");
                        if ticks.send(RefreshTick).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        tracing::debug!(interval_secs = interval.as_secs(), "refresh timer armed");
        self.active = Some(token);
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
            tracing::debug!("refresh timer cancelled");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
