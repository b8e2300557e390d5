use crate::traits::{BlobStore, StorageError, StorageResult, UploadedObject};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectStoreExt, PutPayload, Result as ObjectResult, RetryConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stowage_core::GcsConfig;

/// Google Cloud Storage implementation
///
/// One instance wraps one bucket and owns a single client built at startup; uploads
/// and deletes reuse it.
#[derive(Clone)]
pub struct GcsStorage {
    store: GoogleCloudStorage,
    bucket: String,
}

impl GcsStorage {
    /// Create a new GcsStorage instance
    ///
    /// # Arguments
    /// * `bucket` - GCS bucket name
    /// * `key_filename` - Optional service account JSON; credentials are taken from the
    ///   environment (`GOOGLE_APPLICATION_CREDENTIALS`, `GOOGLE_SERVICE_ACCOUNT`) otherwise
    /// * `max_retries` - Client-level retry count for transient failures
    /// * `timeout` - Per-request timeout applied by the HTTP client
    pub fn new(
        bucket: String,
        key_filename: Option<PathBuf>,
        max_retries: usize,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let retry = RetryConfig {
            max_retries,
            ..Default::default()
        };

        let mut builder = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.clone())
            .with_retry(retry)
            .with_client_options(ClientOptions::new().with_timeout(timeout));

        if let Some(path) = key_filename {
            builder = builder.with_service_account_path(path.to_string_lossy());
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(GcsStorage { store, bucket })
    }

    pub fn from_config(config: &GcsConfig, bucket: &str) -> StorageResult<Self> {
        Self::new(
            bucket.to_string(),
            config.key_filename.clone(),
            config.client_retries(),
            config.upload_timeout,
        )
    }
}

#[async_trait]
impl BlobStore for GcsStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        destination_key: &str,
    ) -> StorageResult<UploadedObject> {
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(local_path.display().to_string())
            } else {
                StorageError::UploadFailed(format!(
                    "Failed to read {}: {}",
                    local_path.display(),
                    e
                ))
            }
        })?;

        let size = data.len() as u64;
        let location = ObjectPath::from(destination_key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %destination_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "GCS upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %destination_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS upload successful"
        );

        Ok(UploadedObject {
            bucket: self.bucket.clone(),
            key: destination_key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = ObjectPath::from(key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "GCS delete failed"
            );
            match e {
                object_store::Error::NotFound { .. } => StorageError::NotFound(key.to_string()),
                other => StorageError::DeleteFailed(other.to_string()),
            }
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GCS delete successful"
        );

        Ok(())
    }
}
