//! Engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters, shared by the slot manager, recorder, and reaper.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Task-start events accepted into a track
    pub events_recorded: AtomicU64,
    /// Events too far behind the newest bucket to retain
    pub stale_events_dropped: AtomicU64,
    /// Not-above to above threshold transitions observed
    pub threshold_crossings: AtomicU64,
    /// Audit records accepted by the recorder queue
    pub audit_submitted: AtomicU64,
    /// Audit records dropped because the queue was full or closed
    pub audit_dropped: AtomicU64,
    /// Audit records the store failed to persist (error or timeout)
    pub audit_append_failures: AtomicU64,
    /// Tracks removed by the reaper
    pub tracks_evicted: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_events_recorded(&self) {
        self.events_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_stale_events_dropped(&self) {
        self.stale_events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_threshold_crossings(&self) {
        self.threshold_crossings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_audit_submitted(&self) {
        self.audit_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_audit_dropped(&self) {
        self.audit_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_audit_append_failures(&self) {
        self.audit_append_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_tracks_evicted(&self, n: u64) {
        self.tracks_evicted.fetch_add(n, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_recorded: self.events_recorded.load(Ordering::Relaxed),
            stale_events_dropped: self.stale_events_dropped.load(Ordering::Relaxed),
            threshold_crossings: self.threshold_crossings.load(Ordering::Relaxed),
            audit_submitted: self.audit_submitted.load(Ordering::Relaxed),
            audit_dropped: self.audit_dropped.load(Ordering::Relaxed),
            audit_append_failures: self.audit_append_failures.load(Ordering::Relaxed),
            tracks_evicted: self.tracks_evicted.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub events_recorded: u64,
    pub stale_events_dropped: u64,
    pub threshold_crossings: u64,
    pub audit_submitted: u64,
    pub audit_dropped: u64,
    pub audit_append_failures: u64,
    pub tracks_evicted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = EngineMetrics::new();
        metrics.inc_events_recorded();
        metrics.inc_events_recorded();
        metrics.inc_audit_dropped();
        metrics.add_tracks_evicted(3);

        let snap = metrics.snapshot();
        assert_eq!(snap.events_recorded, 2);
        assert_eq!(snap.audit_dropped, 1);
        assert_eq!(snap.tracks_evicted, 3);
        assert_eq!(snap.threshold_crossings, 0);
    }
}
