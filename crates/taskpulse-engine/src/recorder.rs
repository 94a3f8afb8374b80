//! Best-effort high-activity audit recording.
//!
//! The slot manager hands crossings to an [`AuditSink`] without awaiting.
//! [`HighActivityRecorder`] pushes them into a bounded queue and
//! [`RecorderWorker`] drains that queue into a [`HighActivityStore`]. A full
//! queue or a failing store loses the record and bumps a counter; ingestion
//! never waits on persistence.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use taskpulse_core::error::AppError;
use taskpulse_core::result::AppResult;
use taskpulse_database::HighActivityStore;
use taskpulse_entity::NewHighActivityRecord;

use crate::metrics::EngineMetrics;

/// Destination for high-activity records emitted on threshold crossings.
///
/// `append` is called from the ingestion path and must not block.
pub trait AuditSink: Send + Sync + std::fmt::Debug + 'static {
    /// Hand off one record. An error means the record was not accepted.
    fn append(&self, record: NewHighActivityRecord) -> AppResult<()>;
}

/// Sink that discards every record. Used when history is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn append(&self, _record: NewHighActivityRecord) -> AppResult<()> {
        Ok(())
    }
}

/// Queue front of the recorder.
#[derive(Debug, Clone)]
pub struct HighActivityRecorder {
    sender: mpsc::Sender<NewHighActivityRecord>,
}

impl HighActivityRecorder {
    /// Create a recorder and the receiving end for its worker.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NewHighActivityRecord>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl AuditSink for HighActivityRecorder {
    fn append(&self, record: NewHighActivityRecord) -> AppResult<()> {
        match self.sender.try_send(record) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(record)) => Err(AppError::service_unavailable(
                format!(
                    "Audit queue full, dropping record for user {}",
                    record.user_id
                ),
            )),
            Err(mpsc::error::TrySendError::Closed(record)) => {
                Err(AppError::service_unavailable(format!(
                    "Audit queue closed, dropping record for user {}",
                    record.user_id
                )))
            }
        }
    }
}

/// Background task persisting queued records.
#[derive(Debug)]
pub struct RecorderWorker {
    receiver: mpsc::Receiver<NewHighActivityRecord>,
    store: Arc<dyn HighActivityStore>,
    metrics: Arc<EngineMetrics>,
    append_timeout: Duration,
}

impl RecorderWorker {
    pub fn new(
        receiver: mpsc::Receiver<NewHighActivityRecord>,
        store: Arc<dyn HighActivityStore>,
        metrics: Arc<EngineMetrics>,
        append_timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            store,
            metrics,
            append_timeout,
        }
    }

    /// Persist records until the cancel signal fires or every sender is
    /// dropped, then flush whatever is still queued.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            append_timeout_ms = self.append_timeout.as_millis() as u64,
            "High-activity recorder started"
        );

        loop {
            tokio::select! {
                maybe = self.receiver.recv() => {
                    match maybe {
                        Some(record) => self.persist(record).await,
                        None => break,
                    }
                }
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("High-activity recorder received shutdown signal");
                        break;
                    }
                }
            }
        }

        self.receiver.close();
        let mut flushed = 0u64;
        while let Some(record) = self.receiver.recv().await {
            self.persist(record).await;
            flushed += 1;
        }

        tracing::info!(flushed, "High-activity recorder stopped");
    }

    async fn persist(&self, record: NewHighActivityRecord) {
        let user_id = record.user_id;
        let count = record.count_in_window;
        match tokio::time::timeout(self.append_timeout, self.store.append(&record)).await {
            Ok(Ok(stored)) => {
                tracing::debug!(
                    id = stored.id,
                    user_id = %stored.user_id,
                    count = stored.count_in_window,
                    "Persisted high-activity record"
                );
            }
            Ok(Err(e)) => {
                self.metrics.inc_audit_append_failures();
                tracing::warn!(
                    user_id = %user_id,
                    count,
                    error = %e,
                    "Failed to persist high-activity record"
                );
            }
            Err(_) => {
                self.metrics.inc_audit_append_failures();
                tracing::warn!(
                    user_id = %user_id,
                    count,
                    append_timeout_ms = self.append_timeout.as_millis() as u64,
                    "Timed out persisting high-activity record"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::DateTime;

    use taskpulse_core::error::ErrorKind;
    use taskpulse_core::types::id::UserId;
    use taskpulse_database::{HistoryQuery, MemoryHighActivityStore};
    use taskpulse_entity::HighActivityRecord;

    use super::*;

    fn record(user_id: i64) -> NewHighActivityRecord {
        NewHighActivityRecord {
            user_id: UserId(user_id),
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            count_in_window: 11,
            window_seconds: 30,
        }
    }

    #[derive(Debug)]
    struct FailingStore;

    #[async_trait]
    impl HighActivityStore for FailingStore {
        async fn append(&self, _record: &NewHighActivityRecord) -> AppResult<HighActivityRecord> {
            Err(AppError::database("connection refused"))
        }

        async fn query(&self, _query: &HistoryQuery) -> AppResult<Vec<HighActivityRecord>> {
            Ok(Vec::new())
        }
    }

    #[derive(Debug)]
    struct StalledStore;

    #[async_trait]
    impl HighActivityStore for StalledStore {
        async fn append(&self, _record: &NewHighActivityRecord) -> AppResult<HighActivityRecord> {
            std::future::pending().await
        }

        async fn query(&self, _query: &HistoryQuery) -> AppResult<Vec<HighActivityRecord>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_full_queue_rejects_without_blocking() {
        let (recorder, _receiver) = HighActivityRecorder::channel(1);
        recorder.append(record(1)).unwrap();

        let err = recorder.append(record(2)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_closed_queue_rejects() {
        let (recorder, receiver) = HighActivityRecorder::channel(4);
        drop(receiver);

        let err = recorder.append(record(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_worker_flushes_queue_on_shutdown() {
        let store = Arc::new(MemoryHighActivityStore::new());
        let metrics = Arc::new(EngineMetrics::new());
        let (recorder, receiver) = HighActivityRecorder::channel(16);
        for user in 1..=5 {
            recorder.append(record(user)).unwrap();
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();
        let worker = RecorderWorker::new(
            receiver,
            store.clone(),
            metrics.clone(),
            Duration::from_secs(1),
        );
        worker.run(cancel_rx).await;

        // Sender stays alive: the worker must exit on the signal alone.
        drop(recorder);

        assert_eq!(store.len(), 5);
        assert_eq!(metrics.snapshot().audit_append_failures, 0);
    }

    #[tokio::test]
    async fn test_worker_stops_when_senders_dropped() {
        let store = Arc::new(MemoryHighActivityStore::new());
        let metrics = Arc::new(EngineMetrics::new());
        let (recorder, receiver) = HighActivityRecorder::channel(16);
        recorder.append(record(42)).unwrap();
        drop(recorder);

        let (_cancel_tx, cancel_rx) = watch::channel(false);
        RecorderWorker::new(receiver, store.clone(), metrics, Duration::from_secs(1))
            .run(cancel_rx)
            .await;

        let stored = store.records();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, UserId(42));
    }

    #[tokio::test]
    async fn test_store_errors_are_counted() {
        let metrics = Arc::new(EngineMetrics::new());
        let (recorder, receiver) = HighActivityRecorder::channel(4);
        recorder.append(record(1)).unwrap();
        recorder.append(record(2)).unwrap();
        drop(recorder);

        let (_cancel_tx, cancel_rx) = watch::channel(false);
        RecorderWorker::new(
            receiver,
            Arc::new(FailingStore),
            metrics.clone(),
            Duration::from_secs(1),
        )
        .run(cancel_rx)
        .await;

        assert_eq!(metrics.snapshot().audit_append_failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_append_timeout_is_counted() {
        let metrics = Arc::new(EngineMetrics::new());
        let (recorder, receiver) = HighActivityRecorder::channel(4);
        recorder.append(record(1)).unwrap();
        drop(recorder);

        let (_cancel_tx, cancel_rx) = watch::channel(false);
        RecorderWorker::new(
            receiver,
            Arc::new(StalledStore),
            metrics.clone(),
            Duration::from_millis(50),
        )
        .run(cancel_rx)
        .await;

        assert_eq!(metrics.snapshot().audit_append_failures, 1);
    }
}
