//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use taskpulse_core::config::AppConfig;
use taskpulse_database::HighActivityStore;
use taskpulse_engine::{ActiveTaskQuery, SlotManager};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped (or cheap handles) for cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Live activity engine (ingestion side)
    pub manager: Arc<SlotManager>,
    /// Read-only view of the engine
    pub query: ActiveTaskQuery,
    /// Durable high-activity history
    pub history: Arc<dyn HighActivityStore>,
    /// Process start, for the health endpoint
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        manager: Arc<SlotManager>,
        history: Arc<dyn HighActivityStore>,
    ) -> Self {
        Self {
            config,
            query: ActiveTaskQuery::new(Arc::clone(&manager)),
            manager,
            history,
            started_at: Instant::now(),
        }
    }
}
