//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /api/active_task/record`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordTaskRequest {
    /// The user who started a task.
    #[validate(range(min = 1, message = "user_id must be positive"))]
    pub user_id: i64,
}
