//! Stowage Database Layer
//!
//! Repositories over the `files` and `images` tables written by the upload intake.
//! The pipeline only needs an ordered scan over still-local records and a
//! whole-record update, expressed by [`AssetRecordStore`].

pub mod db;
pub mod store_traits;

pub use db::assets::{AssetRow, PgAssetRepository};
pub use db::create_pool;
pub use store_traits::AssetRecordStore;
