//! # taskpulse-entity
//!
//! Persisted domain models for TaskPulse.

pub mod high_activity;

pub use high_activity::model::{HighActivityRecord, NewHighActivityRecord};
