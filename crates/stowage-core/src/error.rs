//! Error types module
//!
//! All failures of the migration and derivative workflows are unified under
//! `AppError`. Each variant describes itself: whether a retry can help, whether the
//! condition is an expected terminal state rather than a failure, and which log level
//! it should be reported at.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

use crate::models::AssetKind;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected, uninteresting outcomes
    Debug,
    /// Warning level - for conditions that do not fail the run
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing credentials or bucket, invalid style dimensions. Raised before any side effect.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("Upload of {key} timed out after {seconds}s")]
    UploadTimeout { key: String, seconds: u64 },

    /// A style's URL points at the local route but its file is gone.
    #[error("Local file missing: {path}")]
    MissingLocalFile { path: String },

    /// Remote object removal while destroying an asset.
    #[error("Failed to delete {key}: {message}")]
    RemoteDelete { key: String, message: String },

    /// Local file removal after a successful upload. Logged and swallowed by callers.
    #[error("Failed to remove local file {path}: {message}")]
    LocalCleanup { path: String, message: String },

    /// Nothing left to migrate for a collection. Not a failure.
    #[error("No local {kind} records to migrate")]
    EmptySource { kind: AssetKind },

    #[error("Failed to persist {kind} record {id}: {message}")]
    Persistence {
        kind: AssetKind,
        id: i64,
        message: String,
    },

    #[error("Failed to read source {url}: {message}")]
    Download { url: String, message: String },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Upload { .. } => "UPLOAD_ERROR",
            AppError::UploadTimeout { .. } => "UPLOAD_TIMEOUT",
            AppError::MissingLocalFile { .. } => "MISSING_LOCAL_FILE",
            AppError::RemoteDelete { .. } => "REMOTE_DELETE_ERROR",
            AppError::LocalCleanup { .. } => "LOCAL_CLEANUP_ERROR",
            AppError::EmptySource { .. } => "EMPTY_SOURCE",
            AppError::Persistence { .. } => "PERSISTENCE_ERROR",
            AppError::Download { .. } => "DOWNLOAD_ERROR",
            AppError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether re-invoking the same operation can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Upload { .. }
                | AppError::UploadTimeout { .. }
                | AppError::RemoteDelete { .. }
                | AppError::Persistence { .. }
                | AppError::Download { .. }
                | AppError::Database(_)
        )
    }

    /// Expected terminal conditions that must not fail a run
    pub fn is_expected(&self) -> bool {
        matches!(self, AppError::EmptySource { .. })
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::EmptySource { .. } | AppError::LocalCleanup { .. } => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}
