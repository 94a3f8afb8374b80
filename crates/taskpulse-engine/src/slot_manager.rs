//! Slot manager: owns every user's activity track.
//!
//! Tracks live in a [`DashMap`] keyed by user, each behind its own mutex, so
//! writers for different users never contend and a query never blocks
//! ingestion for longer than one slot's critical section. The map's shard
//! lock is held only to look up or insert a slot, never while counting.
//!
//! Threshold crossings are detected under the slot's lock, so concurrent
//! writers for one user produce exactly one crossing per excursion above the
//! threshold. The audit hand-off happens after the lock is released.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use taskpulse_core::clock::Clock;
use taskpulse_core::config::{ActiveTaskConfig, MAX_WINDOW_SECONDS};
use taskpulse_core::types::id::UserId;
use taskpulse_entity::NewHighActivityRecord;

use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::recorder::AuditSink;
use crate::track::ActivityTrack;

/// One entry of a ranking: a user and their task starts in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub user_id: UserId,
    pub count: u64,
}

/// Point-in-time summary of the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTaskStats {
    /// Window the counts below were taken over.
    pub window_seconds: u64,
    /// Users with at least one task start in the window.
    pub active_users: usize,
    /// Task starts across all users in the window.
    pub total_events: u64,
    /// Highest single-user count in the window.
    pub max_user_count: u64,
    /// Users whose count in the window exceeds the threshold.
    pub users_above_threshold: usize,
    pub high_activity_threshold: u64,
    /// Tracks held in memory, including idle ones awaiting the reaper.
    pub tracked_users: usize,
    /// Epoch seconds at which the summary was taken.
    pub generated_at: i64,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Default)]
struct TrackSlot {
    track: ActivityTrack,
    /// Whether the last event left the user above the threshold.
    above_threshold: bool,
    /// Set by the reaper when the slot is removed from the map; a writer that
    /// still holds the old `Arc` retries against a fresh slot.
    evicted: bool,
}

/// Concurrent registry of per-user activity tracks.
#[derive(Debug)]
pub struct SlotManager {
    tracks: DashMap<UserId, Arc<Mutex<TrackSlot>>>,
    clock: Arc<dyn Clock>,
    active_window_seconds: u64,
    high_activity_threshold: u64,
    audit: Arc<dyn AuditSink>,
    metrics: Arc<EngineMetrics>,
}

impl SlotManager {
    pub fn new(
        config: &ActiveTaskConfig,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            tracks: DashMap::new(),
            clock,
            active_window_seconds: config.active_window_seconds.clamp(1, MAX_WINDOW_SECONDS),
            high_activity_threshold: config.high_activity_threshold,
            audit,
            metrics,
        }
    }

    /// The window used for threshold detection and as the default ranking window.
    pub fn active_window_seconds(&self) -> u64 {
        self.active_window_seconds
    }

    pub fn high_activity_threshold(&self) -> u64 {
        self.high_activity_threshold
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Record one task start for `user_id` at the clock's current instant.
    ///
    /// Returns the user's count in the active window after the event. When
    /// this event moves the user from at-or-below to above the threshold, one
    /// high-activity record is handed to the audit sink.
    pub fn record_task_start(&self, user_id: UserId) -> u64 {
        let (now, count, crossed) = loop {
            let slot = self.slot_for(user_id);
            let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
            if guard.evicted {
                continue;
            }

            let now = self.clock.now();
            if guard.track.record_event(now) {
                self.metrics.inc_events_recorded();
            } else {
                self.metrics.inc_stale_events_dropped();
            }

            let count = guard.track.count_in_window(now, self.active_window_seconds);
            let above = count > self.high_activity_threshold;
            let crossed = above && !guard.above_threshold;
            guard.above_threshold = above;
            break (now, count, crossed);
        };

        if crossed {
            self.emit_crossing(user_id, now, count);
        }
        count
    }

    fn slot_for(&self, user_id: UserId) -> Arc<Mutex<TrackSlot>> {
        if let Some(slot) = self.tracks.get(&user_id) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.tracks.entry(user_id).or_default().value())
    }

    fn emit_crossing(&self, user_id: UserId, now: DateTime<Utc>, count: u64) {
        self.metrics.inc_threshold_crossings();
        tracing::info!(
            user_id = %user_id,
            count,
            window_seconds = self.active_window_seconds,
            threshold = self.high_activity_threshold,
            "User crossed high-activity threshold"
        );

        let record = NewHighActivityRecord {
            user_id,
            timestamp: now,
            count_in_window: count,
            window_seconds: self.active_window_seconds,
        };
        match self.audit.append(record) {
            Ok(()) => self.metrics.inc_audit_submitted(),
            Err(e) => {
                self.metrics.inc_audit_dropped();
                tracing::warn!(
                    user_id = %user_id,
                    count,
                    error = %e,
                    "Dropped high-activity record"
                );
            }
        }
    }

    /// Every user with a non-zero count in the window, ordered by count
    /// descending and then by user id ascending.
    ///
    /// Windows wider than [`MAX_WINDOW_SECONDS`] are treated as the maximum.
    pub fn get_active_task_rank(&self, window: Duration) -> Vec<RankEntry> {
        let mut rank = self.collect_counts(clamp_window(window));
        rank.sort_unstable_by(rank_order);
        rank
    }

    /// The first `k` entries of [`get_active_task_rank`](Self::get_active_task_rank)
    /// without sorting the whole population.
    pub fn get_active_task_rank_top(&self, window: Duration, k: usize) -> Vec<RankEntry> {
        let mut rank = self.collect_counts(clamp_window(window));
        if k == 0 {
            return Vec::new();
        }
        if rank.len() > k {
            rank.select_nth_unstable_by(k - 1, rank_order);
            rank.truncate(k);
        }
        rank.sort_unstable_by(rank_order);
        rank
    }

    /// One user's count in the window (0 when the user is unknown).
    pub fn count_for_user(&self, user_id: UserId, window: Duration) -> u64 {
        let window_seconds = clamp_window(window);
        let slot = match self.tracks.get(&user_id) {
            Some(slot) => Arc::clone(slot.value()),
            None => return 0,
        };

        let now = self.clock.now();
        let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
        if guard.evicted {
            return 0;
        }
        guard.track.evict_expired(now);
        guard.track.count_in_window(now, window_seconds)
    }

    /// Number of tracks currently held, idle ones included.
    pub fn tracked_users(&self) -> usize {
        self.tracks.len()
    }

    /// Summary over `window`.
    pub fn stats(&self, window: Duration) -> ActiveTaskStats {
        let window_seconds = clamp_window(window);
        let generated_at = self.clock.now().timestamp();
        let counts = self.collect_counts(window_seconds);

        ActiveTaskStats {
            window_seconds,
            active_users: counts.len(),
            total_events: counts.iter().map(|e| e.count).sum(),
            max_user_count: counts.iter().map(|e| e.count).max().unwrap_or(0),
            users_above_threshold: counts
                .iter()
                .filter(|e| e.count > self.high_activity_threshold)
                .count(),
            high_activity_threshold: self.high_activity_threshold,
            tracked_users: self.tracks.len(),
            generated_at,
            metrics: self.metrics.snapshot(),
        }
    }

    /// Remove every track with no bucket inside the retention horizon.
    /// Returns how many were removed.
    pub fn reap(&self) -> usize {
        let now = self.clock.now();
        let before = self.tracks.len();

        self.tracks.retain(|_, slot| {
            let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
            guard.track.evict_expired(now);
            if guard.track.is_fully_decayed(now) {
                guard.evicted = true;
                false
            } else {
                true
            }
        });

        let removed = before.saturating_sub(self.tracks.len());
        if removed > 0 {
            self.metrics.add_tracks_evicted(removed as u64);
        }
        removed
    }

    /// Counts for every user with activity in the window. The clock is read
    /// once so all users are measured against the same instant.
    fn collect_counts(&self, window_seconds: u64) -> Vec<RankEntry> {
        let now = self.clock.now();
        let slots: Vec<(UserId, Arc<Mutex<TrackSlot>>)> = self
            .tracks
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        slots
            .into_iter()
            .filter_map(|(user_id, slot)| {
                let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
                if guard.evicted {
                    return None;
                }
                guard.track.evict_expired(now);
                let count = guard.track.count_in_window(now, window_seconds);
                (count > 0).then_some(RankEntry { user_id, count })
            })
            .collect()
    }
}

fn rank_order(a: &RankEntry, b: &RankEntry) -> std::cmp::Ordering {
    b.count.cmp(&a.count).then(a.user_id.cmp(&b.user_id))
}

/// Whole seconds of `window`, capped at [`MAX_WINDOW_SECONDS`].
pub fn clamp_window(window: Duration) -> u64 {
    window.as_secs().min(MAX_WINDOW_SECONDS)
}
