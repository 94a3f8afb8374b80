//! Periodic removal of fully decayed tracks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::slot_manager::SlotManager;

/// Background task that calls [`SlotManager::reap`] on a fixed interval.
#[derive(Debug)]
pub struct Reaper {
    manager: Arc<SlotManager>,
    interval: Duration,
}

impl Reaper {
    pub fn new(manager: Arc<SlotManager>, interval: Duration) -> Self {
        Self {
            manager,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    /// Run until the cancel signal is received.
    pub async fn run(self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            interval_seconds = self.interval.as_secs(),
            "Track reaper started"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can be decayed yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.manager.reap();
                    tracing::debug!(
                        removed,
                        remaining = self.manager.tracked_users(),
                        "Reaper pass finished"
                    );
                }
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Track reaper received shutdown signal");
                        break;
                    }
                }
            }
        }
    }
}
