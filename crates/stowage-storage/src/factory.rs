#[cfg(feature = "storage-gcs")]
use crate::traits::StorageResult;
#[cfg(feature = "storage-gcs")]
use crate::GcsStorage;
use crate::BlobStore;
use std::sync::Arc;
use stowage_core::AssetKind;
#[cfg(feature = "storage-gcs")]
use stowage_core::GcsConfig;

/// One blob store per record collection
#[derive(Clone)]
pub struct BlobStores {
    pub files: Arc<dyn BlobStore>,
    pub images: Arc<dyn BlobStore>,
}

impl BlobStores {
    pub fn for_kind(&self, kind: AssetKind) -> Arc<dyn BlobStore> {
        match kind {
            AssetKind::File => self.files.clone(),
            AssetKind::Image => self.images.clone(),
        }
    }
}

/// Build the blob stores from configuration
///
/// When both collections share a bucket they also share a client.
#[cfg(feature = "storage-gcs")]
pub fn create_blob_stores(config: &GcsConfig) -> StorageResult<BlobStores> {
    let files: Arc<dyn BlobStore> = Arc::new(GcsStorage::from_config(config, &config.file_bucket)?);

    let images: Arc<dyn BlobStore> = if config.image_bucket == config.file_bucket {
        files.clone()
    } else {
        Arc::new(GcsStorage::from_config(config, &config.image_bucket)?)
    };

    tracing::info!(
        file_bucket = %config.file_bucket,
        image_bucket = %config.image_bucket,
        max_retries = config.client_retries(),
        "Object store clients created"
    );

    Ok(BlobStores { files, images })
}
