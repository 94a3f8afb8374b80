//! # taskpulse-engine
//!
//! Active-task sliding-window ranking engine. Provides:
//!
//! - Per-user activity tracks of one-second buckets over the last hour
//! - The slot manager: ingestion, windowed counts, ranking, and stats
//! - High-activity crossing detection with best-effort audit recording
//! - A background reaper that drops fully decayed tracks
//! - A read-only query façade for the HTTP layer

pub mod facade;
pub mod global;
pub mod metrics;
pub mod reaper;
pub mod recorder;
pub mod slot_manager;
pub mod track;

pub use facade::{ActiveTaskQuery, RankResult, RankedUser};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use reaper::Reaper;
pub use recorder::{AuditSink, HighActivityRecorder, NoopAuditSink, RecorderWorker};
pub use slot_manager::{ActiveTaskStats, RankEntry, SlotManager};
pub use track::ActivityTrack;
