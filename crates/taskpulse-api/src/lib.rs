//! # taskpulse-api
//!
//! HTTP API layer for TaskPulse built on Axum.
//!
//! Provides the active-task endpoints (rank, stats, history, record), the
//! health check, request logging, CORS, and the `AppError` to HTTP mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
