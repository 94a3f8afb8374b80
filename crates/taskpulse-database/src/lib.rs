//! # taskpulse-database
//!
//! PostgreSQL connection management and the durable, append-only store
//! for high-activity history records, plus an in-process store with the
//! same query semantics.

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::HistoryDatabase;
pub use memory::MemoryHighActivityStore;
pub use repositories::high_activity::HighActivityRepository;
pub use store::{HighActivityStore, HistoryQuery};
