//! Lenient query parameters for the active-task endpoints.
//!
//! Values arrive as raw strings so that malformed input falls back to a
//! default instead of rejecting the request.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use taskpulse_core::config::MAX_WINDOW_SECONDS;
use taskpulse_database::HistoryQuery;

/// Ranking rows returned when `limit` is absent or invalid.
pub const DEFAULT_RANK_LIMIT: usize = 50;
/// Upper bound on ranking rows.
pub const MAX_RANK_LIMIT: usize = 200;
/// History rows returned when `limit` is absent or invalid.
pub const DEFAULT_HISTORY_LIMIT: u32 = 100;
/// Upper bound on history rows.
pub const MAX_HISTORY_LIMIT: u32 = 500;

/// `GET /api/active_task/rank` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankParams {
    /// Window in seconds; fractional values are floored.
    pub window: Option<String>,
    pub limit: Option<String>,
}

impl RankParams {
    /// The requested window in whole seconds, or `None` to use the engine's
    /// active window. Input that is non-numeric or floors to zero yields
    /// `None`; anything above the maximum window is capped.
    pub fn window(&self) -> Option<Duration> {
        let seconds = self.window.as_deref()?.trim().parse::<f64>().ok()?;
        if !seconds.is_finite() || seconds < 1.0 {
            return None;
        }
        Some(Duration::from_secs(
            (seconds.floor() as u64).min(MAX_WINDOW_SECONDS),
        ))
    }

    /// Row limit in `1..=MAX_RANK_LIMIT`.
    pub fn limit(&self) -> usize {
        match parse_i64(self.limit.as_deref()) {
            n if n <= 0 => DEFAULT_RANK_LIMIT,
            n => (n as u64).min(MAX_RANK_LIMIT as u64) as usize,
        }
    }
}

/// `GET /api/active_task/history` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryParams {
    /// Epoch seconds; absent or 0 means unbounded.
    pub start_time: Option<String>,
    /// Epoch seconds; absent or 0 means unbounded.
    pub end_time: Option<String>,
    /// Absent or 0 means all users.
    pub user_id: Option<String>,
    pub limit: Option<String>,
}

impl HistoryParams {
    /// Row limit in `1..=MAX_HISTORY_LIMIT`.
    pub fn limit(&self) -> u32 {
        match parse_i64(self.limit.as_deref()) {
            n if n <= 0 => DEFAULT_HISTORY_LIMIT,
            n => (n as u64).min(u64::from(MAX_HISTORY_LIMIT)) as u32,
        }
    }

    pub fn to_query(&self) -> HistoryQuery {
        HistoryQuery::from_raw(
            parse_i64(self.start_time.as_deref()),
            parse_i64(self.end_time.as_deref()),
            parse_i64(self.user_id.as_deref()),
            self.limit(),
        )
    }
}

/// Parse an integer parameter, treating absent or malformed input as 0.
fn parse_i64(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0)
}
