//! Storage abstraction traits
//!
//! `BlobStore` is the only capability the pipeline needs from an object store:
//! upload a local file under a key, and delete a key. `AssetSource` reads an already
//! stored artifact back by URL.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;

use crate::keys;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Acknowledgement of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub bucket: String,
    pub key: String,
}

impl UploadedObject {
    /// Publicly reachable HTTPS URL of the object.
    pub fn public_url(&self) -> String {
        keys::public_url(&self.bucket, &self.key)
    }
}

/// Blob storage capability
///
/// Implementations hold one long-lived client for a single bucket.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Bucket this store writes to
    fn bucket(&self) -> &str;

    /// Upload the file at `local_path` under `destination_key`.
    ///
    /// Returns only once the store has acknowledged the write.
    async fn upload_file(
        &self,
        local_path: &Path,
        destination_key: &str,
    ) -> StorageResult<UploadedObject>;

    /// Delete an object by key
    async fn delete(&self, key: &str) -> StorageResult<()>;
}

/// Reader for artifacts that are already remote
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the full contents behind `url`
    async fn fetch(&self, url: &str) -> StorageResult<Bytes>;
}
