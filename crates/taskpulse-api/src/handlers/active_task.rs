//! Active-task ranking, stats, history, and ingestion handlers.

use axum::Json;
use axum::extract::{Query, State};
use validator::Validate;

use taskpulse_core::error::AppError;
use taskpulse_core::types::id::UserId;
use taskpulse_engine::{ActiveTaskStats, RankResult};

use crate::dto::request::RecordTaskRequest;
use crate::dto::response::{ApiResponse, HistoryResponse, RecordResponse};
use crate::error::ApiError;
use crate::extractors::{HistoryParams, RankParams};
use crate::state::AppState;

/// GET /api/active_task/rank
pub async fn rank(
    State(state): State<AppState>,
    Query(params): Query<RankParams>,
) -> Json<ApiResponse<RankResult>> {
    let result = state.query.rank(params.window(), params.limit());
    Json(ApiResponse::ok(result))
}

/// GET /api/active_task/stats
pub async fn stats(State(state): State<AppState>) -> Json<ApiResponse<ActiveTaskStats>> {
    Json(ApiResponse::ok(state.query.stats()))
}

/// GET /api/active_task/history
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ApiResponse<HistoryResponse>>, ApiError> {
    let query = params.to_query();
    let records = state.history.query(&query).await.map_err(|e| {
        AppError::new(
            e.kind,
            format!("Failed to load high-activity history: {}", e.message),
        )
    })?;

    Ok(Json(ApiResponse::ok(HistoryResponse {
        total: records.len(),
        records,
    })))
}

/// POST /api/active_task/record
pub async fn record(
    State(state): State<AppState>,
    Json(req): Json<RecordTaskRequest>,
) -> Result<Json<ApiResponse<RecordResponse>>, ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid record request: {e}")))?;

    let user_id = UserId(req.user_id);
    let count = state.manager.record_task_start(user_id);

    Ok(Json(ApiResponse::ok(RecordResponse {
        user_id,
        count,
        window_seconds: state.manager.active_window_seconds(),
    })))
}
