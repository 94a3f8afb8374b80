//! # taskpulse-core
//!
//! Core crate for TaskPulse. Contains the configuration schemas, the clock
//! abstraction, typed user identifiers, and the unified error system.
//!
//! This crate has **no** internal dependencies on other TaskPulse crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AppError;
pub use result::AppResult;
pub use types::id::UserId;
