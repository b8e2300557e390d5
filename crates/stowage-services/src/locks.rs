//! Per-record mutual exclusion
//!
//! Migration and derivative generation both rewrite a record's `urls` and
//! `extraData`. Holding the record's lock across read-modify-save keeps one from
//! overwriting the other's keys.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use stowage_core::AssetKind;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockKey = (AssetKind, i64);

#[derive(Clone, Default)]
pub struct RecordLocks {
    inner: Arc<Mutex<HashMap<LockKey, Weak<AsyncMutex<()>>>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one record. Released when the guard drops.
    pub async fn lock(&self, kind: AssetKind, id: i64) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, entry| entry.strong_count() > 0);
            match map.get(&(kind, id)).and_then(Weak::upgrade) {
                Some(existing) => existing,
                None => {
                    let created = Arc::new(AsyncMutex::new(()));
                    map.insert((kind, id), Arc::downgrade(&created));
                    created
                }
            }
        };
        mutex.lock_owned().await
    }

    /// Records currently locked or waited on
    pub fn in_use(&self) -> usize {
        let map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.values().filter(|entry| entry.strong_count() > 0).count()
    }
}
