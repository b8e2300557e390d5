use async_trait::async_trait;
use std::sync::Arc;
use stowage_core::constants::ORIGINAL_STYLE;
use stowage_core::{AppError, AssetKind, AssetRecord};
use stowage_storage::BlobStore;

use super::AssetBackend;

/// Backend for generic files: a single object per record.
pub struct FileBackend {
    blobs: Arc<dyn BlobStore>,
}

impl FileBackend {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }
}

#[async_trait]
impl AssetBackend for FileBackend {
    fn kind(&self) -> AssetKind {
        AssetKind::File
    }

    #[tracing::instrument(skip(self, record), fields(record_id = record.id))]
    async fn destroy(&self, record: &AssetRecord) -> Result<(), AppError> {
        let key = record.key(ORIGINAL_STYLE).unwrap_or(&record.name);

        self.blobs.delete(key).await.map_err(|e| {
            let error = AppError::RemoteDelete {
                key: key.to_string(),
                message: e.to_string(),
            };
            tracing::error!(bucket = %self.blobs.bucket(), error = %error, "Failed to delete file object");
            error
        })?;

        tracing::info!(bucket = %self.blobs.bucket(), key = %key, "File object deleted");
        Ok(())
    }
}
