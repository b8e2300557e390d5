use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use stowage_core::{AppError, AssetKind, AssetRecord};
use stowage_db::AssetRecordStore;
use stowage_storage::keys::migration_key;
use stowage_storage::{BlobStore, LocalUploadRoot};

use crate::locks::RecordLocks;
use crate::logging::log_app_error;
use crate::upload::upload_with_timeout;

/// Moves the local styles of one record to object storage.
pub struct AssetMigrator {
    kind: AssetKind,
    store: Arc<dyn AssetRecordStore>,
    blobs: Arc<dyn BlobStore>,
    local_root: LocalUploadRoot,
    local_url_prefix: String,
    upload_timeout: Duration,
    date: Option<NaiveDate>,
    locks: RecordLocks,
}

impl AssetMigrator {
    pub fn new(
        kind: AssetKind,
        store: Arc<dyn AssetRecordStore>,
        blobs: Arc<dyn BlobStore>,
        local_root: LocalUploadRoot,
        local_url_prefix: impl Into<String>,
        upload_timeout: Duration,
        locks: RecordLocks,
    ) -> Self {
        Self {
            kind,
            store,
            blobs,
            local_root,
            local_url_prefix: local_url_prefix.into(),
            upload_timeout,
            date: None,
            locks,
        }
    }

    /// Use a fixed date for key prefixes instead of the current UTC date.
    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Migrate every local style of `record`, returning the styles uploaded.
    ///
    /// `record` is reloaded under the record lock before any work and holds the
    /// saved state on success. Every local style is uploaded first; the record is
    /// then flagged non-local and saved once, and only after that save are the local
    /// copies removed. Any failure before the save leaves both the stored record and
    /// the local files untouched, so re-running uploads the same keys again.
    #[tracing::instrument(skip(self, record), fields(kind = %self.kind, record_id = record.id))]
    pub async fn migrate(&self, record: &mut AssetRecord) -> Result<Vec<String>, AppError> {
        let _guard = self.locks.lock(self.kind, record.id).await;

        match self.store.find(self.kind, record.id).await? {
            Some(current) => *record = current,
            None => {
                tracing::warn!(record_id = record.id, "Record disappeared before migration");
                return Ok(Vec::new());
            }
        }

        if !record.is_local_storage {
            tracing::debug!(record_id = record.id, "Record already migrated");
            return Ok(Vec::new());
        }

        if !record.has_local_urls(&self.local_url_prefix) {
            tracing::warn!(
                record_id = record.id,
                "Record is flagged local but has no local URLs, leaving it unchanged"
            );
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());
        let mut migrated = Vec::new();
        let mut local_copies = Vec::new();

        for style in record.local_styles(&self.local_url_prefix) {
            local_copies.push(self.upload_style(record, &style, date).await?);
            migrated.push(style);
        }

        record.storage_name = Some(self.kind.storage_name().to_string());
        record.is_local_storage = false;
        self.store.save(record).await?;

        for path in &local_copies {
            self.remove_local_copy(path).await;
        }

        tracing::info!(
            record_id = record.id,
            name = %record.name,
            styles = migrated.len(),
            duration_ms = start.elapsed().as_millis(),
            "Record migrated to object storage"
        );

        Ok(migrated)
    }

    /// Upload one style and point the in-memory record at it, returning the local path.
    async fn upload_style(
        &self,
        record: &mut AssetRecord,
        style: &str,
        date: NaiveDate,
    ) -> Result<PathBuf, AppError> {
        let local_path = self
            .local_root
            .path_for(style, &record.name)
            .map_err(|e| AppError::Internal(format!("{} {}: {}", self.kind, record.id, e)))?;
        let key = migration_key(date, style, &record.name)
            .map_err(|e| AppError::Internal(format!("{} {}: {}", self.kind, record.id, e)))?;

        let uploaded =
            upload_with_timeout(self.blobs.as_ref(), &local_path, &key, self.upload_timeout).await?;
        tracing::debug!(style = %style, key = %uploaded.key, "Style uploaded");
        record.set_remote_style(style, uploaded.public_url(), uploaded.key);

        Ok(local_path)
    }

    async fn remove_local_copy(&self, path: &Path) {
        match self.local_root.remove(path).await {
            Ok(true) => {
                tracing::debug!(path = %path.display(), "Local copy removed");
            }
            Ok(false) => {
                tracing::warn!(path = %path.display(), "Local copy already gone");
            }
            Err(e) => {
                let error = AppError::LocalCleanup {
                    path: path.display().to_string(),
                    message: e.to_string(),
                };
                log_app_error(&error, "Failed to remove local copy after migration");
            }
        }
    }
}
