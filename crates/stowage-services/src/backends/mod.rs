//! Per-collection storage backends
//!
//! What the rest of the system asks of a migrated asset: where to redirect a
//! download, how to delete it, how to describe a fresh upload, and (images only) how
//! to derive its styles.

mod files;
mod images;

pub use files::FileBackend;
pub use images::ImageBackend;

use async_trait::async_trait;
use chrono::Utc;
use stowage_core::constants::{GCS_STORAGE_CLASS, ORIGINAL_STYLE};
use stowage_core::{AppError, AssetKind, AssetRecord, ExtraData, StorageName};
use uuid::Uuid;

use crate::derivatives::DerivativeReport;

/// Style derivation, offered by backends whose assets have styles.
#[async_trait]
pub trait DerivativeCapability: Send + Sync {
    /// Render, upload and save every configured style of `record`.
    ///
    /// On return `record` holds what was saved.
    async fn generate_image_styles(&self, record: &mut AssetRecord) -> Result<DerivativeReport, AppError>;
}

#[async_trait]
pub trait AssetBackend: Send + Sync {
    fn kind(&self) -> AssetKind;

    fn storage_name(&self) -> StorageName {
        self.kind().storage_name()
    }

    /// Where a download of `style` (default `original`) should be redirected.
    fn redirect_url<'a>(&self, record: &'a AssetRecord, style: Option<&str>) -> Option<&'a str> {
        record.url(style.unwrap_or(ORIGINAL_STYLE))
    }

    /// Remove the asset's remote objects.
    async fn destroy(&self, record: &AssetRecord) -> Result<(), AppError>;

    /// Fill in `extraData` for a record just uploaded to `bucket`, unless already set.
    fn describe_upload(&self, record: &mut AssetRecord, bucket: &str) {
        if record.extra_data.is_some() {
            return;
        }
        let mut extra = ExtraData {
            public_id: Some(record.name.clone()),
            bucket: Some(bucket.to_string()),
            storage_class: Some(GCS_STORAGE_CLASS.to_string()),
            ..ExtraData::default()
        };
        extra
            .keys
            .insert(ORIGINAL_STYLE.to_string(), record.name.clone());
        record.extra_data = Some(extra);
    }

    /// Unique stored name for an upload: `{epoch_millis}_{uuid}.{ext}`.
    fn generate_filename(&self, original_name: &str) -> String {
        let stem = format!("{}_{}", Utc::now().timestamp_millis(), Uuid::new_v4());
        match original_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => format!("{}.{}", stem, ext.to_lowercase()),
            _ => stem,
        }
    }

    fn derivatives(&self) -> Option<&dyn DerivativeCapability> {
        None
    }
}
