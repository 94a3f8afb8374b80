//! Route definitions for the TaskPulse HTTP API.
//!
//! All routes are mounted under `/api` and receive `AppState` through Axum's
//! `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(active_task_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Active-task ranking, stats, history, and ingestion
fn active_task_routes() -> Router<AppState> {
    Router::new()
        .route("/active_task/rank", get(handlers::active_task::rank))
        .route("/active_task/stats", get(handlers::active_task::stats))
        .route("/active_task/history", get(handlers::active_task::history))
        .route("/active_task/record", post(handlers::active_task::record))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
