//! PostgreSQL backing for the high-activity history.
//!
//! [`HistoryDatabase::open`] is the whole startup path for the `postgres`
//! provider: connect, apply the embedded migrations, then confirm the history
//! table is readable before the recorder starts writing to it.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use taskpulse_core::config::{DatabaseConfig, HistoryConfig};
use taskpulse_core::error::{AppError, ErrorKind};
use taskpulse_core::result::AppResult;

use crate::repositories::high_activity::HighActivityRepository;

const APPLICATION_NAME: &str = "taskpulse";

/// Connection pool dedicated to the history table.
#[derive(Debug, Clone)]
pub struct HistoryDatabase {
    pool: PgPool,
}

impl HistoryDatabase {
    /// Connect, migrate and verify the history table.
    pub async fn open(database: &DatabaseConfig, history: &HistoryConfig) -> AppResult<Self> {
        let options = connect_options(database, history)?;
        info!(
            provider = %history.provider,
            host = options.get_host(),
            port = options.get_port(),
            database = options.get_database().unwrap_or("-"),
            statement_timeout_ms = history.append_timeout_ms,
            max_connections = database.max_connections,
            "Opening high-activity history database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(database.max_connections)
            .min_connections(database.min_connections.min(database.max_connections))
            .acquire_timeout(Duration::from_secs(database.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(database.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(|e| db_error("Failed to connect to history database", e))?;

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .map_err(|e| db_error("Failed to migrate history table", e))?;

        sqlx::query("SELECT 1 FROM high_active_task_history LIMIT 1")
            .fetch_optional(&pool)
            .await
            .map_err(|e| db_error("History table is not readable", e))?;

        info!(provider = %history.provider, "High-activity history database ready");
        Ok(Self { pool })
    }

    /// A store writing to this database.
    pub fn repository(&self) -> HighActivityRepository {
        HighActivityRepository::new(self.pool.clone())
    }

    /// Close all connections once the recorder has drained.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("History database pool closed");
    }
}

/// Connection options for the history pool. Every session carries a
/// `statement_timeout` equal to the recorder's append timeout, so an insert
/// the recorder has given up on is also cancelled server-side.
pub fn connect_options(
    database: &DatabaseConfig,
    history: &HistoryConfig,
) -> AppResult<PgConnectOptions> {
    let options = PgConnectOptions::from_str(&database.url)
        .map_err(|e| AppError::with_source(ErrorKind::Configuration, "Invalid database.url", e))?;

    Ok(options
        .application_name(APPLICATION_NAME)
        .options([("statement_timeout", history.append_timeout_ms.max(1))]))
}

fn db_error(context: &str, err: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::with_source(ErrorKind::Database, format!("{context}: {err}"), err)
}
