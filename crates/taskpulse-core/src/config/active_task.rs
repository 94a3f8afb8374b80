//! Active-task engine configuration.

use serde::{Deserialize, Serialize};

/// Largest window, in seconds, the engine answers for. Tracks never retain
/// buckets older than this relative to their newest bucket.
pub const MAX_WINDOW_SECONDS: u64 = 3600;

/// Sliding-window engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTaskConfig {
    /// Window used by queries that omit one, and by the high-activity rule.
    #[serde(default = "default_active_window")]
    pub active_window_seconds: u64,
    /// A user whose count in the active window goes strictly above this value
    /// produces one history record per upward crossing.
    #[serde(default = "default_threshold")]
    pub high_activity_threshold: u64,
    /// How often the reaper drops fully decayed tracks.
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_seconds: u64,
}

impl Default for ActiveTaskConfig {
    fn default() -> Self {
        Self {
            active_window_seconds: default_active_window(),
            high_activity_threshold: default_threshold(),
            reaper_interval_seconds: default_reaper_interval(),
        }
    }
}

fn default_active_window() -> u64 {
    30
}

fn default_threshold() -> u64 {
    60
}

fn default_reaper_interval() -> u64 {
    MAX_WINDOW_SECONDS
}
