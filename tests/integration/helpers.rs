//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use taskpulse_api::{AppState, build_router};
use taskpulse_core::clock::ManualClock;
use taskpulse_core::config::AppConfig;
use taskpulse_database::{HighActivityStore, MemoryHighActivityStore};
use taskpulse_engine::{EngineMetrics, HighActivityRecorder, RecorderWorker, SlotManager};

/// Epoch second every test clock starts at.
pub const START: i64 = 1_700_000_000;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Engine behind the router
    pub manager: Arc<SlotManager>,
    /// Clock driving the engine
    pub clock: Arc<ManualClock>,
    /// History store the recorder writes to
    pub store: Arc<MemoryHighActivityStore>,
    shutdown: watch::Sender<bool>,
    recorder: Option<JoinHandle<()>>,
}

impl TestApp {
    /// Create a test application with the default 30s window and `threshold`.
    pub fn new(threshold: u64) -> Self {
        let mut config = AppConfig::from_toml_str(
            r#"
            [history]
            provider = "memory"
            "#,
        )
        .expect("Failed to parse test config");
        config.active_task.high_activity_threshold = threshold;

        let store = Arc::new(MemoryHighActivityStore::new());
        Self::with_store(config, Arc::clone(&store) as Arc<dyn HighActivityStore>, store)
    }

    /// Create a test application whose history endpoint reads from `history`.
    pub fn with_store(
        config: AppConfig,
        history: Arc<dyn HighActivityStore>,
        store: Arc<MemoryHighActivityStore>,
    ) -> Self {
        let clock = Arc::new(ManualClock::at_epoch_seconds(START));
        let metrics = Arc::new(EngineMetrics::new());
        let (shutdown, shutdown_rx) = watch::channel(false);

        let (recorder, receiver) = HighActivityRecorder::channel(config.history.queue_capacity);
        let worker = RecorderWorker::new(
            receiver,
            Arc::clone(&store) as Arc<dyn HighActivityStore>,
            Arc::clone(&metrics),
            std::time::Duration::from_millis(config.history.append_timeout_ms),
        );
        let handle = tokio::spawn(worker.run(shutdown_rx));

        let manager = Arc::new(SlotManager::new(
            &config.active_task,
            Arc::clone(&clock) as Arc<dyn taskpulse_core::clock::Clock>,
            Arc::new(recorder),
            metrics,
        ));

        let state = AppState::new(Arc::new(config), Arc::clone(&manager), history);

        Self {
            router: build_router(state),
            manager,
            clock,
            store,
            shutdown,
            recorder: Some(handle),
        }
    }

    /// Stop the recorder and wait until every queued record is stored.
    pub async fn drain_history(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.recorder.take() {
            handle.await.expect("Recorder task panicked");
        }
    }

    /// Record `n` task starts for `user_id` through the HTTP endpoint.
    pub async fn record(&self, user_id: i64, n: usize) -> TestResponse {
        let mut last = None;
        for _ in 0..n {
            last = Some(
                self.request(
                    "POST",
                    "/api/active_task/record",
                    Some(serde_json::json!({ "user_id": user_id })),
                )
                .await,
            );
        }
        last.expect("record called with n = 0")
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
