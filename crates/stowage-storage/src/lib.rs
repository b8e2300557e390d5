//! Stowage Storage Library
//!
//! This crate provides the blob-store abstraction the migration pipeline talks to,
//! its Google Cloud Storage implementation, the helper that locates assets under the
//! local upload roots, and the reader used to fetch canonical artifacts by URL.
//!
//! # Object key format
//!
//! - **Migration uploads**: `{YYYY/MM/DD}/{style}/{name}`, dated by the day of the
//!   migration rather than the original upload.
//! - **Derivative uploads**: `{style}/{name}`.
//!
//! Public URLs are always `https://storage.googleapis.com/{bucket}/{key}`. Key and URL
//! generation lives in the `keys` module so every caller produces identical values.

pub mod factory;
#[cfg(feature = "storage-gcs")]
pub mod gcs;
pub mod keys;
pub mod local;
#[cfg(feature = "source-http")]
pub mod source;
pub mod traits;

// Re-export commonly used types
pub use factory::BlobStores;
#[cfg(feature = "storage-gcs")]
pub use factory::create_blob_stores;
#[cfg(feature = "storage-gcs")]
pub use gcs::GcsStorage;
pub use local::LocalUploadRoot;
#[cfg(feature = "source-http")]
pub use source::HttpSource;
pub use traits::{AssetSource, BlobStore, StorageError, StorageResult, UploadedObject};
