//! In-process history store.
//!
//! Same query semantics as the PostgreSQL repository. Used by tests and by
//! deployments configured with `history.provider = "memory"`, where the trail
//! does not survive a restart. The store holds at most `max_records` rows and
//! discards the oldest insertions beyond that.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use taskpulse_core::result::AppResult;
use taskpulse_entity::{HighActivityRecord, NewHighActivityRecord};

use crate::store::{HighActivityStore, HistoryQuery};

/// Capacity used by [`MemoryHighActivityStore::new`].
pub const DEFAULT_MAX_RECORDS: usize = 100_000;

#[derive(Debug, Default)]
struct Inner {
    records: VecDeque<HighActivityRecord>,
    next_id: i64,
}

/// Bounded history store held in memory.
#[derive(Debug)]
pub struct MemoryHighActivityStore {
    inner: Mutex<Inner>,
    max_records: usize,
}

impl Default for MemoryHighActivityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHighActivityStore {
    /// Create an empty store holding up to [`DEFAULT_MAX_RECORDS`].
    pub fn new() -> Self {
        Self::with_max_records(DEFAULT_MAX_RECORDS)
    }

    /// Create an empty store holding up to `max_records` (at least one).
    pub fn with_max_records(max_records: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_records: max_records.max(1),
        }
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .records
            .len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retained records in insertion order.
    pub fn records(&self) -> Vec<HighActivityRecord> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .records
            .iter()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HighActivityStore for MemoryHighActivityStore {
    async fn append(&self, record: &NewHighActivityRecord) -> AppResult<HighActivityRecord> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_id += 1;
        let stored = record.clone().into_record(inner.next_id);
        if inner.records.len() == self.max_records {
            inner.records.pop_front();
        }
        inner.records.push_back(stored.clone());
        Ok(stored)
    }

    async fn query(&self, query: &HistoryQuery) -> AppResult<Vec<HighActivityRecord>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut matched: Vec<HighActivityRecord> = inner
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        matched.truncate(query.limit as usize);
        Ok(matched)
    }
}
