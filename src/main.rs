//! TaskPulse Server: live active-task ranking with high-activity history.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{EnvFilter, fmt};

use taskpulse_api::{AppState, build_router};
use taskpulse_core::clock::SystemClock;
use taskpulse_core::config::AppConfig;
use taskpulse_core::error::AppError;
use taskpulse_database::{HighActivityStore, HistoryDatabase, MemoryHighActivityStore};
use taskpulse_engine::{
    AuditSink, EngineMetrics, HighActivityRecorder, NoopAuditSink, Reaper, RecorderWorker,
    SlotManager, global,
};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `TASKPULSE_ENV` overlay, and `TASKPULSE__*` variables.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("TASKPULSE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting TaskPulse v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // ── Step 1: History store ────────────────────────────────────
    let (history, history_db) = build_history_store(&config).await?;

    // ── Step 2: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 3: High-activity recorder ───────────────────────────
    let metrics = Arc::new(EngineMetrics::new());
    let (audit, recorder_handle): (Arc<dyn AuditSink>, Option<JoinHandle<()>>) =
        if config.history.enabled {
            let (recorder, receiver) = HighActivityRecorder::channel(config.history.queue_capacity);
            let worker = RecorderWorker::new(
                receiver,
                Arc::clone(&history),
                Arc::clone(&metrics),
                Duration::from_millis(config.history.append_timeout_ms),
            );
            let handle = tokio::spawn(worker.run(shutdown_rx.clone()));
            (Arc::new(recorder) as Arc<dyn AuditSink>, Some(handle))
        } else {
            tracing::info!("High-activity history disabled");
            (Arc::new(NoopAuditSink) as Arc<dyn AuditSink>, None)
        };

    // ── Step 4: Slot manager + reaper ────────────────────────────
    let manager = global::install(Arc::new(SlotManager::new(
        &config.active_task,
        Arc::new(SystemClock),
        audit,
        metrics,
    )))?;
    tracing::info!(
        "Active-task engine ready (window={}s, threshold={})",
        manager.active_window_seconds(),
        manager.high_activity_threshold()
    );

    let reaper = Reaper::new(
        Arc::clone(&manager),
        Duration::from_secs(config.active_task.reaper_interval_seconds),
    );
    let reaper_handle = tokio::spawn(reaper.run(shutdown_rx.clone()));

    // ── Step 5: HTTP server ──────────────────────────────────────
    let state = AppState::new(Arc::clone(&config), manager, history);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("TaskPulse server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 6: Wait for background tasks ────────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if let Some(handle) = recorder_handle {
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Recorder did not drain within {}s", grace.as_secs());
        }
    }
    let _ = tokio::time::timeout(Duration::from_secs(5), reaper_handle).await;

    if let Some(db) = history_db {
        db.close().await;
    }

    tracing::info!("TaskPulse server shut down gracefully");
    Ok(())
}

/// Build the configured history store. PostgreSQL also returns its database
/// so the pool can be closed after the recorder drains.
async fn build_history_store(
    config: &AppConfig,
) -> Result<(Arc<dyn HighActivityStore>, Option<HistoryDatabase>), AppError> {
    if config.history.provider == "postgres" && !config.database.url.is_empty() {
        let db = HistoryDatabase::open(&config.database, &config.history).await?;
        Ok((Arc::new(db.repository()) as Arc<dyn HighActivityStore>, Some(db)))
    } else {
        let store = MemoryHighActivityStore::with_max_records(config.history.memory_max_records);
        tracing::info!(
            provider = "memory",
            max_records = config.history.memory_max_records,
            "High-activity history kept in memory"
        );
        Ok((Arc::new(store) as Arc<dyn HighActivityStore>, None))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
