//! Route handlers organized by domain.

pub mod active_task;
pub mod health;
