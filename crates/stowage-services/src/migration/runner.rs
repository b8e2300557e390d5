use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stowage_core::{AppError, AssetKind, AssetRecord};
use stowage_db::AssetRecordStore;

use super::cursor::RecordCursor;
use super::migrator::AssetMigrator;
use crate::logging::log_app_error;

const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// How often a record is retried after a recoverable failure
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Exponential delay before retry number `attempt` (1-based), capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_RETRY_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

/// Outcome of walking one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub kind: AssetKind,
    /// Records handed to the migrator
    pub visited: usize,
    /// Records flagged non-local by this walk
    pub migrated: usize,
    pub styles_uploaded: usize,
    /// Id of the last record finished; pass it back to resume
    pub last_id: i64,
}

impl CollectionReport {
    fn new(kind: AssetKind, last_id: i64) -> Self {
        Self {
            kind,
            visited: 0,
            migrated: 0,
            styles_uploaded: 0,
            last_id,
        }
    }
}

/// Drives an ordered walk over one collection, one record at a time.
///
/// The first fatal failure stops the walk; records after it are left for a later run.
pub struct MigrationRunner {
    store: Arc<dyn AssetRecordStore>,
    migrator: AssetMigrator,
    retry: RetryPolicy,
}

impl MigrationRunner {
    pub fn new(store: Arc<dyn AssetRecordStore>, migrator: AssetMigrator) -> Self {
        Self {
            store,
            migrator,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Walk the whole collection.
    pub async fn run(&self) -> Result<CollectionReport, AppError> {
        self.run_from(0).await
    }

    /// Walk records with ids greater than `last_id`.
    ///
    /// Finding nothing to migrate is reported as a warning and completes normally.
    pub async fn run_from(&self, last_id: i64) -> Result<CollectionReport, AppError> {
        let kind = self.migrator.kind();
        match self.walk(last_id).await {
            Err(e) if e.is_expected() => {
                log_app_error(&e, &format!("Nothing to migrate after {} {}", kind, last_id));
                Ok(CollectionReport::new(kind, last_id))
            }
            other => other,
        }
    }

    async fn walk(&self, start_after: i64) -> Result<CollectionReport, AppError> {
        let kind = self.migrator.kind();
        let mut cursor = RecordCursor::resume_from(self.store.clone(), kind, start_after);
        let mut report = CollectionReport::new(kind, start_after);
        let start = Instant::now();

        let pending = self.store.count_local(kind).await?;
        tracing::info!(kind = %kind, pending, start_after, "Starting migration walk");

        while let Some(mut record) = cursor.next().await? {
            tracing::info!(kind = %kind, record_id = record.id, name = %record.name, "Migrating record");

            let styles = match self.migrate_with_retry(&mut record).await {
                Ok(styles) => styles,
                Err(e) => {
                    log_app_error(
                        &e,
                        &format!(
                            "Migration walk aborted at {} {}, resume after {}",
                            kind,
                            record.id,
                            cursor.position()
                        ),
                    );
                    return Err(e);
                }
            };

            report.visited += 1;
            if !styles.is_empty() {
                report.migrated += 1;
                report.styles_uploaded += styles.len();
            }
            cursor.advance(record.id);
            report.last_id = cursor.position();
        }

        if report.visited == 0 {
            return Err(AppError::EmptySource { kind });
        }

        tracing::info!(
            kind = %kind,
            visited = report.visited,
            migrated = report.migrated,
            styles_uploaded = report.styles_uploaded,
            duration_ms = start.elapsed().as_millis(),
            "Migration walk finished"
        );

        Ok(report)
    }

    async fn migrate_with_retry(&self, record: &mut AssetRecord) -> Result<Vec<String>, AppError> {
        let mut attempt = 1;
        loop {
            match self.migrator.migrate(record).await {
                Ok(styles) => return Ok(styles),
                Err(e) if e.is_recoverable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        record_id = record.id,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Retrying record after recoverable failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
