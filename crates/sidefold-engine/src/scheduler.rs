//! Resync scheduling: coalesce change-notification bursts into single
//! recompute passes.
//!
//! The page tree publishes its revision through a watch channel, which
//! retains only the latest value. Waiting for a burst therefore never
//! drops the final update of a burst, and at most one recompute is
//! pending at any time no matter how fast notifications arrive.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;

/// Default settle window before a pass runs.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(120);

/// Burst-coalescing wait over a revision watch channel.
#[derive(Debug, Clone, Copy)]
pub struct ResyncScheduler {
    settle: Duration,
}

impl ResyncScheduler {
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Waits for the next change and then for the notifications to go
    /// quiet for the settle window. Each further change restarts the
    /// window, so one pass covers the whole burst.
    ///
    /// Returns `false` once the notifier is gone and every pending change
    /// has been reported; the caller's loop should stop.
    pub async fn next_burst(&self, rx: &mut watch::Receiver<u64>) -> bool {
        if rx.changed().await.is_err() {
            return false;
        }
        loop {
            tokio::select! {
                _ = sleep(self.settle) => return true,
                changed = rx.changed() => {
                    if changed.is_err() {
                        // Notifier dropped mid-burst; run the final pass.
                        return true;
                    }
                }
            }
        }
    }
}

impl Default for ResyncScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}
