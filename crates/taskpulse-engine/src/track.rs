//! Per-user activity track: a sparse ring of one-second buckets.
//!
//! Only seconds that saw at least one event occupy a bucket. Buckets are
//! kept sorted by second, and anything older than [`MAX_WINDOW_SECONDS`]
//! relative to the newest bucket (or to the reading instant) is evicted on
//! access, so a track never holds more than `MAX_WINDOW_SECONDS + 1` buckets.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use taskpulse_core::config::MAX_WINDOW_SECONDS;

const RETENTION_SECONDS: i64 = MAX_WINDOW_SECONDS as i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bucket {
    /// Epoch second this bucket covers.
    second: i64,
    /// Task starts recorded in that second.
    count: u64,
}

/// Time-bucketed task-start counts for one user.
#[derive(Debug, Default, Clone)]
pub struct ActivityTrack {
    buckets: VecDeque<Bucket>,
}

impl ActivityTrack {
    /// Create an empty track.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one event at `now`.
    ///
    /// Events normally land in the newest bucket or open a new one after it.
    /// An event earlier than the newest bucket (clock skew between writers)
    /// is merged into its own second if that second is still retained.
    /// Returns `false` when the event is too old to retain and was dropped.
    pub fn record_event(&mut self, now: DateTime<Utc>) -> bool {
        let second = now.timestamp();

        match self.buckets.back_mut() {
            Some(last) if last.second == second => last.count += 1,
            Some(last) if last.second > second => return self.record_out_of_order(second),
            _ => {
                self.buckets.push_back(Bucket { second, count: 1 });
                self.evict_before(second - RETENTION_SECONDS);
            }
        }
        true
    }

    fn record_out_of_order(&mut self, second: i64) -> bool {
        let newest = match self.buckets.back() {
            Some(b) => b.second,
            None => return false,
        };
        if second < newest - RETENTION_SECONDS {
            return false;
        }

        match self.buckets.binary_search_by_key(&second, |b| b.second) {
            Ok(idx) => self.buckets[idx].count += 1,
            Err(idx) => self.buckets.insert(idx, Bucket { second, count: 1 }),
        }
        true
    }

    /// Drop buckets that fell out of the retention horizon as of `now`.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) {
        self.evict_before(now.timestamp() - RETENTION_SECONDS);
    }

    fn evict_before(&mut self, horizon: i64) {
        while self.buckets.front().is_some_and(|b| b.second < horizon) {
            self.buckets.pop_front();
        }
    }

    /// Events whose second lies in `[now - window, now]`.
    ///
    /// `window_seconds` above [`MAX_WINDOW_SECONDS`] is treated as the maximum.
    /// Buckets after `now` (possible when the clock stepped backwards) are
    /// not counted.
    pub fn count_in_window(&self, now: DateTime<Utc>, window_seconds: u64) -> u64 {
        let now_second = now.timestamp();
        let window = window_seconds.min(MAX_WINDOW_SECONDS) as i64;
        let start = now_second - window;

        self.buckets
            .iter()
            .rev()
            .skip_while(|b| b.second > now_second)
            .take_while(|b| b.second >= start)
            .map(|b| b.count)
            .sum()
    }

    /// Whether every retained bucket is older than the retention horizon,
    /// so the whole track can be dropped without changing any answer.
    pub fn is_fully_decayed(&self, now: DateTime<Utc>) -> bool {
        let horizon = now.timestamp() - RETENTION_SECONDS;
        self.buckets.back().is_none_or(|b| b.second < horizon)
    }

    /// Number of occupied buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Epoch second of the most recent event, if any.
    pub fn last_event_second(&self) -> Option<i64> {
        self.buckets.back().map(|b| b.second)
    }
}
