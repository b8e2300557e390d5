//! Record store abstraction
//!
//! Services depend on this trait rather than on the PostgreSQL repository, so the
//! migration and derivative workflows can run against in-memory stores in tests.

use async_trait::async_trait;
use stowage_core::{AppError, AssetKind, AssetRecord};

#[async_trait]
pub trait AssetRecordStore: Send + Sync {
    /// The still-local record with the smallest id strictly greater than `last_id`.
    ///
    /// Evaluated against live state on every call, so records migrated in the meantime
    /// are not returned again and records inserted with higher ids are picked up.
    async fn find_first_local_after(
        &self,
        kind: AssetKind,
        last_id: i64,
    ) -> Result<Option<AssetRecord>, AppError>;

    /// Look a record up by id, whatever its storage state.
    async fn find(&self, kind: AssetKind, id: i64) -> Result<Option<AssetRecord>, AppError>;

    /// Number of records still flagged local
    async fn count_local(&self, kind: AssetKind) -> Result<i64, AppError>;

    /// Persist `urls`, `extraData`, `isLocalStorage` and `storageName` in one write.
    async fn save(&self, record: &AssetRecord) -> Result<(), AppError>;
}
