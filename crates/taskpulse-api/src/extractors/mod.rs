//! Query-string parameter types.

pub mod params;

pub use params::{HistoryParams, RankParams};
