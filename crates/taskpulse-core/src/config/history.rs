//! High-activity history (audit trail) configuration.

use serde::{Deserialize, Serialize};

/// Where and how high-activity records are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Whether crossings are written to the history store at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Storage backend: `"postgres"` or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Capacity of the queue between the engine and the store writer.
    /// Records arriving while it is full are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Upper bound on a single store append, in milliseconds.
    #[serde(default = "default_append_timeout")]
    pub append_timeout_ms: u64,
    /// Records kept by the `memory` provider; the oldest are discarded first.
    #[serde(default = "default_memory_max_records")]
    pub memory_max_records: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_provider(),
            queue_capacity: default_queue_capacity(),
            append_timeout_ms: default_append_timeout(),
            memory_max_records: default_memory_max_records(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    "postgres".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_append_timeout() -> u64 {
    2000
}

fn default_memory_max_records() -> usize {
    100_000
}
