//! Response DTOs.

use serde::{Deserialize, Serialize};

use taskpulse_core::types::id::UserId;
use taskpulse_entity::HighActivityRecord;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// High-activity history page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub records: Vec<HighActivityRecord>,
    /// Number of records returned (not the number stored).
    pub total: usize,
}

/// Result of recording one task start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse {
    pub user_id: UserId,
    /// The user's count in the active window after this event.
    pub count: u64,
    pub window_seconds: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Activity tracks currently held in memory.
    pub tracked_users: usize,
}
