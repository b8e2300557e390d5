//! Stowage Services
//!
//! Workflows over asset records: moving locally stored files and images to object
//! storage, deriving image styles, and the per-collection backends used by the
//! delivery and delete paths.

pub mod backends;
pub mod derivatives;
pub mod locks;
pub mod logging;
pub mod migration;
pub mod pipeline;

mod upload;

pub use backends::{AssetBackend, DerivativeCapability, FileBackend, ImageBackend};
pub use derivatives::{DerivativeGenerator, DerivativeReport, StyleFailure};
pub use locks::RecordLocks;
pub use logging::log_app_error;
pub use migration::{AssetMigrator, CollectionReport, MigrationRunner, RecordCursor, RetryPolicy};
pub use pipeline::{run_migration, MigrationContext, ResumePoints, RunReport, Stage};
