//! Durable store contract for high-activity history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use taskpulse_core::result::AppResult;
use taskpulse_core::types::id::UserId;
use taskpulse_entity::{HighActivityRecord, NewHighActivityRecord};

/// Filter for reading the history back, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Inclusive lower bound on `timestamp`; `None` means unbounded.
    pub start_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`; `None` means unbounded.
    pub end_time: Option<DateTime<Utc>>,
    /// Restrict to one user; `None` means all users.
    pub user_id: Option<UserId>,
    /// Maximum number of rows returned.
    pub limit: u32,
}

impl HistoryQuery {
    /// Build a query from raw wire values, where `0` (or any non-positive
    /// value) means "unset" for the time bounds and the user id.
    pub fn from_raw(start_time: i64, end_time: i64, user_id: i64, limit: u32) -> Self {
        Self {
            start_time: epoch_bound(start_time),
            end_time: epoch_bound(end_time),
            user_id: Some(UserId::new(user_id)).filter(|id| id.is_valid()),
            limit,
        }
    }

    /// Whether a record passes the time and user filters (ignores `limit`).
    pub fn matches(&self, record: &HighActivityRecord) -> bool {
        if let Some(start) = self.start_time {
            if record.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if record.timestamp > end {
                return false;
            }
        }
        match self.user_id {
            Some(user_id) => record.user_id == user_id,
            None => true,
        }
    }
}

fn epoch_bound(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds <= 0 {
        return None;
    }
    DateTime::from_timestamp(seconds, 0)
}

/// Append-only persistence for high-activity records.
///
/// Records are immutable once written. `query` returns them ordered by
/// `timestamp` descending, newer insertions first on equal timestamps.
#[async_trait]
pub trait HighActivityStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist one record.
    async fn append(&self, record: &NewHighActivityRecord) -> AppResult<HighActivityRecord>;

    /// Read records matching `query`, newest first, at most `query.limit`.
    async fn query(&self, query: &HistoryQuery) -> AppResult<Vec<HighActivityRecord>>;
}
