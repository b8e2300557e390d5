//! Shared key and URL generation.

use chrono::NaiveDate;
use stowage_core::constants::{DATE_PREFIX_FORMAT, GCS_PUBLIC_HOST};

use crate::traits::{StorageError, StorageResult};

/// Reject key segments that could escape their prefix or split into extra segments.
pub fn validate_segment(segment: &str) -> StorageResult<()> {
    if segment.is_empty() || segment.contains("..") || segment.contains('/') || segment.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Invalid key segment: {:?}",
            segment
        )));
    }
    Ok(())
}

/// `YYYY/MM/DD` for the given day.
pub fn date_prefix(date: NaiveDate) -> String {
    date.format(DATE_PREFIX_FORMAT).to_string()
}

/// Key for a migrated artifact: `{YYYY/MM/DD}/{style}/{name}`.
pub fn migration_key(date: NaiveDate, style: &str, name: &str) -> StorageResult<String> {
    validate_segment(style)?;
    validate_segment(name)?;
    Ok(format!("{}/{}/{}", date_prefix(date), style, name))
}

/// Key for a derivative: `{style}/{name}`.
pub fn derivative_key(style: &str, name: &str) -> StorageResult<String> {
    validate_segment(style)?;
    validate_segment(name)?;
    Ok(format!("{}/{}", style, name))
}

/// `https://storage.googleapis.com/{bucket}/{key}`
pub fn public_url(bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", GCS_PUBLIC_HOST, bucket, key)
}
