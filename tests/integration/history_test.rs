//! Integration tests for the high-activity history trail.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;

use taskpulse_core::config::AppConfig;
use taskpulse_core::error::AppError;
use taskpulse_core::result::AppResult;
use taskpulse_database::{HighActivityStore, HistoryQuery, MemoryHighActivityStore};
use taskpulse_entity::{HighActivityRecord, NewHighActivityRecord};

use crate::helpers::{START, TestApp};

#[tokio::test]
async fn test_crossing_writes_one_history_record() {
    let mut app = TestApp::new(10);

    // 11 events over 5 seconds: one crossing.
    for i in 0..11 {
        if i > 0 && i % 3 == 0 {
            app.clock.advance_secs(1);
        }
        app.record(42, 1).await;
    }
    // Still above the threshold: no new crossing.
    app.clock.advance_secs(2);
    app.record(42, 1).await;

    app.drain_history().await;

    let response = app
        .request("GET", "/api/active_task/history", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["total"], 1);

    let record = &response.body["data"]["records"][0];
    assert_eq!(record["user_id"], 42);
    assert_eq!(record["window_seconds"], 30);
    assert_eq!(record["timestamp"], START + 3);
    assert!(record["count_in_window"].as_i64().unwrap() >= 11);

    app.clock.advance_secs(31);
    let rank = app.request("GET", "/api/active_task/rank", None).await;
    assert_eq!(rank.body["data"]["rank"], serde_json::json!([]));
}

#[tokio::test]
async fn test_history_filters_and_orders() {
    let mut app = TestApp::new(1);
    app.record(1, 2).await;
    app.clock.advance_secs(100);
    app.record(2, 2).await;
    app.clock.advance_secs(100);
    app.record(3, 2).await;
    app.drain_history().await;
    assert_eq!(app.store.len(), 3);

    let all = app
        .request("GET", "/api/active_task/history?limit=0", None)
        .await;
    let users: Vec<i64> = all.body["data"]["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["user_id"].as_i64().unwrap())
        .collect();
    assert_eq!(users, vec![3, 2, 1]);

    let one_user = app
        .request("GET", "/api/active_task/history?user_id=2", None)
        .await;
    assert_eq!(one_user.body["data"]["total"], 1);
    assert_eq!(one_user.body["data"]["records"][0]["user_id"], 2);

    let path = format!(
        "/api/active_task/history?start_time={}&end_time={}",
        START + 50,
        START + 150
    );
    let ranged = app.request("GET", &path, None).await;
    assert_eq!(ranged.body["data"]["total"], 1);
    assert_eq!(ranged.body["data"]["records"][0]["user_id"], 2);

    let limited = app
        .request("GET", "/api/active_task/history?limit=2", None)
        .await;
    assert_eq!(limited.body["data"]["total"], 2);
}

#[derive(Debug)]
struct UnavailableStore;

#[async_trait]
impl HighActivityStore for UnavailableStore {
    async fn append(&self, _record: &NewHighActivityRecord) -> AppResult<HighActivityRecord> {
        Err(AppError::database("database is down"))
    }

    async fn query(&self, _query: &HistoryQuery) -> AppResult<Vec<HighActivityRecord>> {
        Err(AppError::database("database is down"))
    }
}

#[tokio::test]
async fn test_history_store_failure_is_500_but_ingestion_continues() {
    let config = AppConfig::from_toml_str(
        r#"
        [active_task]
        high_activity_threshold = 1

        [history]
        provider = "memory"
        "#,
    )
    .unwrap();
    let app = TestApp::with_store(
        config,
        Arc::new(UnavailableStore),
        Arc::new(MemoryHighActivityStore::new()),
    );

    let recorded = app.record(5, 3).await;
    assert_eq!(recorded.status, StatusCode::OK);
    assert_eq!(recorded.body["data"]["count"], 3);

    let response = app
        .request("GET", "/api/active_task/history", None)
        .await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["success"], false);
    assert!(
        response.body["message"]
            .as_str()
            .unwrap()
            .contains("Failed to load high-activity history")
    );
}
