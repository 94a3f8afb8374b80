//! High-activity history repository (PostgreSQL).

use async_trait::async_trait;
use sqlx::PgPool;

use taskpulse_core::error::{AppError, ErrorKind};
use taskpulse_core::result::AppResult;
use taskpulse_entity::high_activity::model::saturating_i64;
use taskpulse_entity::{HighActivityRecord, NewHighActivityRecord};

use crate::store::{HighActivityStore, HistoryQuery};

const COLUMNS: &str = "id, user_id, timestamp, count_in_window, window_seconds";

/// Repository for the `high_active_task_history` table.
#[derive(Debug, Clone)]
pub struct HighActivityRepository {
    pool: PgPool,
}

impl HighActivityRepository {
    /// Create a new high-activity repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build the filtered select for `query`. Placeholders are numbered in the
    /// order start, end, user, limit, skipping the ones that are unset.
    fn select_sql(query: &HistoryQuery) -> String {
        let mut conditions = Vec::new();
        let mut param_idx = 1u32;

        if query.start_time.is_some() {
            conditions.push(format!("timestamp >= ${param_idx}"));
            param_idx += 1;
        }
        if query.end_time.is_some() {
            conditions.push(format!("timestamp <= ${param_idx}"));
            param_idx += 1;
        }
        if query.user_id.is_some() {
            conditions.push(format!("user_id = ${param_idx}"));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conditions.join(" AND "))
        };

        format!(
            "SELECT {COLUMNS} FROM high_active_task_history {where_clause}\
             ORDER BY timestamp DESC, id DESC LIMIT ${param_idx}"
        )
    }
}

#[async_trait]
impl HighActivityStore for HighActivityRepository {
    async fn append(&self, record: &NewHighActivityRecord) -> AppResult<HighActivityRecord> {
        sqlx::query_as::<_, HighActivityRecord>(&format!(
            "INSERT INTO high_active_task_history (user_id, timestamp, count_in_window, window_seconds) \
             VALUES ($1, $2, $3, $4) RETURNING {COLUMNS}"
        ))
        .bind(record.user_id.get())
        .bind(record.timestamp)
        .bind(saturating_i64(record.count_in_window))
        .bind(saturating_i64(record.window_seconds))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to append high-activity record",
                e,
            )
        })
    }

    async fn query(&self, query: &HistoryQuery) -> AppResult<Vec<HighActivityRecord>> {
        let sql = Self::select_sql(query);
        let mut select = sqlx::query_as::<_, HighActivityRecord>(&sql);

        if let Some(start) = query.start_time {
            select = select.bind(start);
        }
        if let Some(end) = query.end_time {
            select = select.bind(end);
        }
        if let Some(user_id) = query.user_id {
            select = select.bind(user_id.get());
        }

        select
            .bind(i64::from(query.limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    "Failed to query high-activity history",
                    e,
                )
            })
    }
}
