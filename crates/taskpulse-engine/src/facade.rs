//! Read-only query façade used by the HTTP layer.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use taskpulse_core::types::id::UserId;

use crate::slot_manager::{ActiveTaskStats, SlotManager, clamp_window};

/// One row of a ranking response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedUser {
    pub user_id: UserId,
    /// Task starts inside the window.
    pub count: u64,
    pub window_seconds: u64,
}

/// A ranking together with the window it was computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankResult {
    pub rank: Vec<RankedUser>,
    pub window_seconds: u64,
}

/// Stateless wrapper over a [`SlotManager`].
#[derive(Debug, Clone)]
pub struct ActiveTaskQuery {
    manager: Arc<SlotManager>,
}

impl ActiveTaskQuery {
    pub fn new(manager: Arc<SlotManager>) -> Self {
        Self { manager }
    }

    /// The window used when a caller does not name one.
    pub fn default_window(&self) -> Duration {
        Duration::from_secs(self.manager.active_window_seconds())
    }

    /// The top `limit` users over `window` (the active window when `None`).
    pub fn rank(&self, window: Option<Duration>, limit: usize) -> RankResult {
        let window = window.unwrap_or_else(|| self.default_window());
        let window_seconds = clamp_window(window);

        let rank = self
            .manager
            .get_active_task_rank_top(window, limit)
            .into_iter()
            .map(|entry| RankedUser {
                user_id: entry.user_id,
                count: entry.count,
                window_seconds,
            })
            .collect();

        RankResult {
            rank,
            window_seconds,
        }
    }

    /// Aggregate stats over the active window.
    pub fn stats(&self) -> ActiveTaskStats {
        self.manager.stats(self.default_window())
    }
}
