//! Integration tests for ranking, stats, and ingestion.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_rank_orders_by_count_then_user() {
    let app = TestApp::new(100);
    app.record(3, 3).await;
    app.record(2, 5).await;
    app.record(1, 5).await;

    let response = app.request("GET", "/api/active_task/rank", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["window_seconds"], 30);
    assert_eq!(
        response.body["data"]["rank"],
        json!([
            { "user_id": 1, "count": 5, "window_seconds": 30 },
            { "user_id": 2, "count": 5, "window_seconds": 30 },
            { "user_id": 3, "count": 3, "window_seconds": 30 },
        ])
    );
}

#[tokio::test]
async fn test_rank_limit_and_window_clamping() {
    let app = TestApp::new(100);
    for user in 1..=5 {
        app.record(user, user as usize).await;
    }

    let response = app
        .request("GET", "/api/active_task/rank?limit=2&window=999999", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["window_seconds"], 3600);
    let rank = response.body["data"]["rank"].as_array().unwrap();
    assert_eq!(rank.len(), 2);
    assert_eq!(rank[0]["user_id"], 5);
    assert_eq!(rank[1]["user_id"], 4);

    let response = app
        .request("GET", "/api/active_task/rank?limit=abc&window=-3", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["window_seconds"], 30);
    assert_eq!(response.body["data"]["rank"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_rank_sub_second_window_uses_active_window() {
    let app = TestApp::new(100);
    app.record(1, 2).await;

    let response = app
        .request("GET", "/api/active_task/rank?window=0.5", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["window_seconds"], 30);
    assert_eq!(
        response.body["data"]["rank"],
        json!([{ "user_id": 1, "count": 2, "window_seconds": 30 }])
    );
}

#[tokio::test]
async fn test_rank_window_excludes_old_activity() {
    let app = TestApp::new(100);
    app.record(1, 4).await;
    app.clock.advance_secs(20);
    app.record(2, 1).await;

    let narrow = app
        .request("GET", "/api/active_task/rank?window=10", None)
        .await;
    let rank = narrow.body["data"]["rank"].as_array().unwrap();
    assert_eq!(rank.len(), 1);
    assert_eq!(rank[0]["user_id"], 2);

    app.clock.advance_secs(31);
    let empty = app.request("GET", "/api/active_task/rank", None).await;
    assert_eq!(empty.body["data"]["rank"], json!([]));
}

#[tokio::test]
async fn test_record_returns_windowed_count() {
    let app = TestApp::new(100);

    let response = app.record(42, 3).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["user_id"], 42);
    assert_eq!(response.body["data"]["count"], 3);
    assert_eq!(response.body["data"]["window_seconds"], 30);
}

#[tokio::test]
async fn test_record_rejects_invalid_user() {
    let app = TestApp::new(100);

    let response = app
        .request(
            "POST",
            "/api/active_task/record",
            Some(json!({ "user_id": 0 })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert_eq!(app.manager.tracked_users(), 0);
}

#[tokio::test]
async fn test_stats_reflect_active_window() {
    let app = TestApp::new(3);
    app.record(1, 5).await;
    app.record(2, 2).await;

    let response = app.request("GET", "/api/active_task/stats", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["window_seconds"], 30);
    assert_eq!(data["active_users"], 2);
    assert_eq!(data["total_events"], 7);
    assert_eq!(data["max_user_count"], 5);
    assert_eq!(data["users_above_threshold"], 1);
    assert_eq!(data["high_activity_threshold"], 3);
    assert_eq!(data["generated_at"], crate::helpers::START);
    assert_eq!(data["metrics"]["events_recorded"], 7);
    assert_eq!(data["metrics"]["threshold_crossings"], 1);
}
