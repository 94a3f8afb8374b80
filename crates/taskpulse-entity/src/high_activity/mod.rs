//! High-activity audit trail entity.

pub mod model;
