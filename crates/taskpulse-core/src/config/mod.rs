//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod active_task;
pub mod app;
pub mod database;
pub mod history;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::active_task::{ActiveTaskConfig, MAX_WINDOW_SECONDS};
pub use self::app::{CorsConfig, ServerConfig};
pub use self::database::DatabaseConfig;
pub use self::history::HistoryConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Sliding-window engine settings.
    #[serde(default)]
    pub active_task: ActiveTaskConfig,
    /// High-activity history settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `TASKPULSE_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TASKPULSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot honor.
    pub fn validate(&self) -> Result<(), AppError> {
        let window = self.active_task.active_window_seconds;
        if window == 0 || window > MAX_WINDOW_SECONDS {
            return Err(AppError::configuration(format!(
                "active_task.active_window_seconds must be in 1..={MAX_WINDOW_SECONDS}, got {window}"
            )));
        }

        if self.active_task.reaper_interval_seconds == 0 {
            return Err(AppError::configuration(
                "active_task.reaper_interval_seconds must be positive",
            ));
        }

        if self.history.queue_capacity == 0 {
            return Err(AppError::configuration(
                "history.queue_capacity must be positive",
            ));
        }

        if self.history.memory_max_records == 0 {
            return Err(AppError::configuration(
                "history.memory_max_records must be positive",
            ));
        }

        match self.history.provider.as_str() {
            "postgres" | "memory" => {}
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown history provider '{other}' (expected 'postgres' or 'memory')"
                )));
            }
        }

        if self.history.enabled
            && self.history.provider == "postgres"
            && self.database.url.is_empty()
        {
            return Err(AppError::configuration(
                "database.url is required when history.provider = 'postgres'",
            ));
        }

        Ok(())
    }
}
