//! Provisional record sweep
//!
//! Presigned uploads leave a `pending` record behind before any byte is written. Nothing
//! reports when (or whether) the client completes the PUT, so a periodic sweep settles
//! those records once their URL can no longer be used: promoted to `committed` if the
//! object arrived, removed otherwise.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use file_engine_core::AppError;
use file_engine_db::FileMetadataStore;
use file_engine_storage::Storage;
use tokio::time::interval;

const DEFAULT_BATCH_SIZE: i64 = 500;

/// Outcome of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub promoted: usize,
    pub removed: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct ProvisionalSweeper {
    storage: Arc<dyn Storage>,
    metadata: Arc<dyn FileMetadataStore>,
    batch_size: i64,
}

impl ProvisionalSweeper {
    pub fn new(storage: Arc<dyn Storage>, metadata: Arc<dyn FileMetadataStore>) -> Self {
        Self {
            storage,
            metadata,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Start the background sweep. Records younger than `older_than` are left alone.
    /// Returns a JoinHandle for graceful shutdown
    pub fn spawn(
        self: Arc<Self>,
        every: Duration,
        older_than: Duration,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(every);

            loop {
                sweep_interval.tick().await;

                match self.sweep_once(older_than).await {
                    Ok(report) if report == SweepReport::default() => {
                        tracing::debug!("No provisional records to settle");
                    }
                    Ok(report) => {
                        tracing::info!(
                            promoted = report.promoted,
                            removed = report.removed,
                            failed = report.failed,
                            "Provisional record sweep completed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Provisional record sweep failed");
                    }
                }
            }
        })
    }

    /// Settle one batch of pending records created more than `older_than` ago.
    #[tracing::instrument(skip(self), fields(sweep.operation = "pending"))]
    pub async fn sweep_once(&self, older_than: Duration) -> Result<SweepReport, AppError> {
        let age = chrono::Duration::from_std(older_than)
            .map_err(|e| AppError::Internal(format!("Invalid sweep age: {}", e)))?;
        let cutoff = Utc::now() - age;

        let pending = self
            .metadata
            .list_pending(cutoff, self.batch_size)
            .await?;
        let mut report = SweepReport::default();

        for file in pending {
            let exists = match self
                .storage
                .exists(&file.container_id, &file.object_key)
                .await
            {
                Ok(exists) => exists,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        file_id = %file.id,
                        key = %file.object_key,
                        "Failed to check provisional object"
                    );
                    report.failed += 1;
                    continue;
                }
            };

            let outcome = if exists {
                self.metadata.mark_committed(file.id).await.map(|changed| {
                    if changed {
                        report.promoted += 1;
                    }
                })
            } else {
                self.metadata.delete(file.id).await.map(|removed| {
                    if removed {
                        report.removed += 1;
                    }
                })
            };

            match outcome {
                Ok(()) => {
                    tracing::debug!(
                        file_id = %file.id,
                        key = %file.object_key,
                        committed = exists,
                        "Provisional record settled"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, file_id = %file.id, "Failed to settle provisional record");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockFileRepository, MockStorage};
    use file_engine_core::{FileRecord, FileStatus};

    fn pending(name: &str, age_secs: i64) -> FileRecord {
        let mut record = MockFileRepository::record_at(
            name,
            "file-engine",
            Utc::now() - chrono::Duration::seconds(age_secs),
        );
        record.object_key = format!("{}_key", name);
        record.status = FileStatus::Pending;
        record
    }

    fn sweeper() -> (Arc<MockStorage>, Arc<MockFileRepository>, ProvisionalSweeper) {
        let storage = Arc::new(MockStorage::new());
        let metadata = Arc::new(MockFileRepository::new());
        let sweeper = ProvisionalSweeper::new(storage.clone(), metadata.clone());
        (storage, metadata, sweeper)
    }

    #[tokio::test]
    async fn test_sweep_promotes_arrived_and_removes_abandoned() {
        let (storage, metadata, sweeper) = sweeper();

        let arrived = pending("arrived.txt", 3600);
        let abandoned = pending("abandoned.txt", 3600);
        let fresh = pending("fresh.txt", 10);
        storage.insert_object("file-engine", &arrived.object_key, b"bytes");
        metadata.insert(arrived.clone());
        metadata.insert(abandoned.clone());
        metadata.insert(fresh.clone());

        let report = sweeper.sweep_once(Duration::from_secs(600)).await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                promoted: 1,
                removed: 1,
                failed: 0
            }
        );
        assert_eq!(metadata.get(arrived.id).unwrap().status, FileStatus::Committed);
        assert!(metadata.get(abandoned.id).is_none());
        assert_eq!(metadata.get(fresh.id).unwrap().status, FileStatus::Pending);
    }

    #[tokio::test]
    async fn test_sweep_ignores_committed_records() {
        let (_storage, metadata, sweeper) = sweeper();
        let committed =
            MockFileRepository::record_at("done.txt", "file-engine", Utc::now() - chrono::Duration::hours(2));
        metadata.insert(committed.clone());

        let report = sweeper.sweep_once(Duration::from_secs(60)).await.unwrap();

        assert_eq!(report, SweepReport::default());
        assert!(metadata.get(committed.id).is_some());
    }

    #[tokio::test]
    async fn test_sweep_counts_failures_and_keeps_rows() {
        let (storage, metadata, sweeper) = sweeper();
        let abandoned = pending("abandoned.txt", 3600);
        metadata.insert(abandoned.clone());
        metadata.fail_delete(true);

        let report = sweeper.sweep_once(Duration::from_secs(60)).await.unwrap();

        assert_eq!(report.failed, 1);
        assert!(metadata.get(abandoned.id).is_some());
        assert_eq!(storage.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_sweep_respects_batch_size() {
        let (_storage, metadata, sweeper) = sweeper();
        for i in 0..5 {
            metadata.insert(pending(&format!("p{}.txt", i), 3600));
        }

        let report = sweeper
            .with_batch_size(2)
            .sweep_once(Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(report.removed, 2);
        assert_eq!(metadata.record_count(), 3);
    }
}
