//! Configuration module
//!
//! Settings are read from the environment (a `.env` file is honoured) and validated
//! before anything touches the network or the filesystem.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_LOCAL_URL_PREFIX;
use crate::error::AppError;
use crate::models::{AssetKind, StyleConfig};

const DB_MAX_CONNECTIONS: u32 = 5;
const GCS_MAX_RETRIES: usize = 2;
const GCS_UPLOAD_TIMEOUT_SECS: u64 = 60;
const DERIVATIVE_CONCURRENCY: usize = 3;
const MIGRATION_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_IMAGE_STYLES: &str = "thumbnail:75x75,medium:250x250,large:640x640";

/// Google Cloud Storage settings
#[derive(Clone, Debug)]
pub struct GcsConfig {
    pub file_bucket: String,
    pub image_bucket: String,
    /// Service account JSON; when absent credentials come from the environment.
    pub key_filename: Option<PathBuf>,
    pub auto_retry: bool,
    pub max_retries: usize,
    pub upload_timeout: Duration,
}

impl GcsConfig {
    pub fn bucket_for(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::File => &self.file_bucket,
            AssetKind::Image => &self.image_bucket,
        }
    }

    /// Retry count handed to the object-store client.
    pub fn client_retries(&self) -> usize {
        if self.auto_retry {
            self.max_retries
        } else {
            0
        }
    }
}

/// Local upload roots and the route prefix that marks a URL as locally served
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub file_upload_path: PathBuf,
    pub image_upload_path: PathBuf,
    pub local_url_prefix: String,
}

impl UploadConfig {
    pub fn root_for(&self, kind: AssetKind) -> &PathBuf {
        match kind {
            AssetKind::File => &self.file_upload_path,
            AssetKind::Image => &self.image_upload_path,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub gcs: GcsConfig,
    pub upload: UploadConfig,
    pub image_styles: Vec<StyleConfig>,
    pub derivative_concurrency: usize,
    pub migration_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let file_bucket = var("GCS_FILE_BUCKET").ok_or_else(|| {
            AppError::Configuration("GCS_FILE_BUCKET must be set".to_string())
        })?;
        let image_bucket = var("GCS_IMAGE_BUCKET").unwrap_or_else(|| file_bucket.clone());

        let gcs = GcsConfig {
            file_bucket,
            image_bucket,
            key_filename: var("GCS_KEY_FILENAME").map(PathBuf::from),
            auto_retry: var("GCS_AUTO_RETRY")
                .map(|v| v.to_lowercase().parse().unwrap_or(true))
                .unwrap_or(true),
            max_retries: var("GCS_MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(GCS_MAX_RETRIES),
            upload_timeout: Duration::from_secs(
                var("GCS_UPLOAD_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(GCS_UPLOAD_TIMEOUT_SECS),
            ),
        };

        let upload = UploadConfig {
            file_upload_path: var("FILE_UPLOAD_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("files/uploads/files")),
            image_upload_path: var("IMAGE_UPLOAD_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("files/uploads/images")),
            local_url_prefix: var("LOCAL_URL_PREFIX")
                .unwrap_or_else(|| DEFAULT_LOCAL_URL_PREFIX.to_string()),
        };

        let image_styles = StyleConfig::parse_list(
            &var("IMAGE_STYLES").unwrap_or_else(|| DEFAULT_IMAGE_STYLES.to_string()),
        )?;

        let config = Config {
            database_url: var("DATABASE_URL").ok_or_else(|| {
                AppError::Configuration("DATABASE_URL must be set".to_string())
            })?,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DB_MAX_CONNECTIONS),
            gcs,
            upload,
            image_styles,
            derivative_concurrency: var("DERIVATIVE_CONCURRENCY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DERIVATIVE_CONCURRENCY),
            migration_max_attempts: var("MIGRATION_MAX_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MIGRATION_MAX_ATTEMPTS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(AppError::Configuration(
                "DATABASE_URL must be a valid PostgreSQL connection string".to_string(),
            ));
        }

        if self.gcs.file_bucket.contains('/') || self.gcs.image_bucket.contains('/') {
            return Err(AppError::Configuration(
                "GCS bucket names must not contain '/'".to_string(),
            ));
        }

        if !self.upload.local_url_prefix.starts_with('/') {
            return Err(AppError::Configuration(
                "LOCAL_URL_PREFIX must be an absolute route path".to_string(),
            ));
        }

        if self.derivative_concurrency == 0 {
            return Err(AppError::Configuration(
                "DERIVATIVE_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        if self.migration_max_attempts == 0 {
            return Err(AppError::Configuration(
                "MIGRATION_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        for style in &self.image_styles {
            style.validate()?;
        }

        Ok(())
    }
}
