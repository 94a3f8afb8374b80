//! Concrete repository implementations.

pub mod high_activity;
