//! High-activity history entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use taskpulse_core::types::id::UserId;

/// An immutable audit row written when a user's windowed task count crosses
/// the high-activity threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HighActivityRecord {
    /// Store-assigned identifier, increasing in insertion order.
    pub id: i64,
    /// The user whose activity crossed the threshold.
    #[sqlx(try_from = "i64")]
    pub user_id: UserId,
    /// When the crossing was observed (epoch seconds on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Task starts counted in the window at the moment of crossing.
    pub count_in_window: i64,
    /// Width of the window the count was taken over.
    pub window_seconds: i64,
}

/// Data required to append a high-activity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHighActivityRecord {
    /// The user whose activity crossed the threshold.
    pub user_id: UserId,
    /// When the crossing was observed.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Task starts counted in the window at the moment of crossing.
    pub count_in_window: u64,
    /// Width of the window the count was taken over.
    pub window_seconds: u64,
}

impl NewHighActivityRecord {
    /// Materialize the record with the identifier the store assigned.
    pub fn into_record(self, id: i64) -> HighActivityRecord {
        HighActivityRecord {
            id,
            user_id: self.user_id,
            timestamp: self.timestamp,
            count_in_window: saturating_i64(self.count_in_window),
            window_seconds: saturating_i64(self.window_seconds),
        }
    }
}

/// Convert an unsigned counter to the signed column type, clamping at `i64::MAX`.
pub fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
