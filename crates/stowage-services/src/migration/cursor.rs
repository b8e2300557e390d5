use std::sync::Arc;
use stowage_core::{AppError, AssetKind, AssetRecord};
use stowage_db::AssetRecordStore;

/// Position of an ordered walk over the still-local records of one collection.
///
/// Each call queries live state, so the walk holds nothing but the last id it
/// finished. Restarting from that id resumes the walk.
pub struct RecordCursor {
    store: Arc<dyn AssetRecordStore>,
    kind: AssetKind,
    last_id: i64,
}

impl RecordCursor {
    pub fn new(store: Arc<dyn AssetRecordStore>, kind: AssetKind) -> Self {
        Self::resume_from(store, kind, 0)
    }

    pub fn resume_from(store: Arc<dyn AssetRecordStore>, kind: AssetKind, last_id: i64) -> Self {
        Self {
            store,
            kind,
            last_id,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Id of the last record the walk finished
    pub fn position(&self) -> i64 {
        self.last_id
    }

    /// The next still-local record after the current position, if any.
    pub async fn next(&self) -> Result<Option<AssetRecord>, AppError> {
        self.store.find_first_local_after(self.kind, self.last_id).await
    }

    /// Move past `id` once its record has been handled.
    pub fn advance(&mut self, id: i64) {
        if id > self.last_id {
            self.last_id = id;
        }
    }
}
