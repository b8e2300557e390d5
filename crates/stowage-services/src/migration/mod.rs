//! Local-to-object-storage migration
//!
//! A walk over one collection visits still-local records in ascending id order,
//! uploads each local style, rewrites the record to point at the remote copies and
//! removes the local files.

pub mod cursor;
pub mod migrator;
pub mod runner;

pub use cursor::RecordCursor;
pub use migrator::AssetMigrator;
pub use runner::{CollectionReport, MigrationRunner, RetryPolicy};
