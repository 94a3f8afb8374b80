//! Integration test for the health endpoint.

use axum::http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(60);
    app.record(7, 1).await;

    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["tracked_users"], 1);
    assert!(response.body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new(60);
    let response = app.request("GET", "/api/nope", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
