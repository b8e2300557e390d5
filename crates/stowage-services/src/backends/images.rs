use async_trait::async_trait;
use std::sync::Arc;
use stowage_core::{AppError, AssetKind, AssetRecord, StyleConfig};
use stowage_db::AssetRecordStore;
use stowage_storage::BlobStore;

use super::{AssetBackend, DerivativeCapability};
use crate::derivatives::{DerivativeGenerator, DerivativeReport};
use crate::locks::RecordLocks;

/// Backend for images: one object per style, plus style derivation.
pub struct ImageBackend {
    blobs: Arc<dyn BlobStore>,
    store: Arc<dyn AssetRecordStore>,
    generator: DerivativeGenerator,
    styles: Vec<StyleConfig>,
    locks: RecordLocks,
}

impl ImageBackend {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        store: Arc<dyn AssetRecordStore>,
        generator: DerivativeGenerator,
        styles: Vec<StyleConfig>,
        locks: RecordLocks,
    ) -> Self {
        Self {
            blobs,
            store,
            generator,
            styles,
            locks,
        }
    }

    pub fn styles(&self) -> &[StyleConfig] {
        &self.styles
    }
}

#[async_trait]
impl AssetBackend for ImageBackend {
    fn kind(&self) -> AssetKind {
        AssetKind::Image
    }

    /// Delete every recorded style object, one at a time.
    ///
    /// A failed delete is logged and does not stop the rest; the first one is returned.
    #[tracing::instrument(skip(self, record), fields(record_id = record.id))]
    async fn destroy(&self, record: &AssetRecord) -> Result<(), AppError> {
        let mut first_error = None;

        for key in record.remote_keys() {
            match self.blobs.delete(&key).await {
                Ok(()) => {
                    tracing::debug!(bucket = %self.blobs.bucket(), key = %key, "Image object deleted");
                }
                Err(e) => {
                    let error = AppError::RemoteDelete {
                        key: key.clone(),
                        message: e.to_string(),
                    };
                    tracing::error!(bucket = %self.blobs.bucket(), error = %error, "Failed to delete image object");
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn derivatives(&self) -> Option<&dyn DerivativeCapability> {
        Some(self)
    }
}

#[async_trait]
impl DerivativeCapability for ImageBackend {
    async fn generate_image_styles(&self, record: &mut AssetRecord) -> Result<DerivativeReport, AppError> {
        let _guard = self.locks.lock(AssetKind::Image, record.id).await;

        if let Some(current) = self.store.find(AssetKind::Image, record.id).await? {
            *record = current;
        }

        let report = self.generator.generate_styles(record, &self.styles).await?;
        if !report.succeeded.is_empty() {
            self.store.save(record).await?;
        }

        Ok(report)
    }
}
