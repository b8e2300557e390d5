//! Test helpers: in-memory record store, recording blob store and fixtures.
//!
//! Run with: `cargo test -p stowage-services`

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stowage_core::{AppError, AssetKind, AssetRecord, Config};
use stowage_db::AssetRecordStore;
use stowage_processing::{ImageTransformer, ResizedImage, Resizer};
use stowage_services::MigrationContext;
use stowage_storage::{AssetSource, BlobStore, BlobStores, StorageError, StorageResult, UploadedObject};
use tempfile::TempDir;

pub const BUCKET: &str = "my-bucket";

pub fn migration_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 5, 1).unwrap()
}

/// Record store backed by a map, with save counting and failure injection.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<BTreeMap<(AssetKind, i64), AssetRecord>>,
    saves: AtomicUsize,
    failing_saves: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: AssetRecord) {
        self.records
            .lock()
            .unwrap()
            .insert((record.kind, record.id), record);
    }

    pub fn get(&self, kind: AssetKind, id: i64) -> AssetRecord {
        self.records
            .lock()
            .unwrap()
            .get(&(kind, id))
            .cloned()
            .unwrap_or_else(|| panic!("no {} record {}", kind, id))
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Fail the next `count` saves.
    pub fn fail_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssetRecordStore for InMemoryRecordStore {
    async fn find_first_local_after(
        &self,
        kind: AssetKind,
        last_id: i64,
    ) -> Result<Option<AssetRecord>, AppError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| r.kind == kind && r.id > last_id && r.is_local_storage)
            .min_by_key(|r| r.id)
            .cloned())
    }

    async fn find(&self, kind: AssetKind, id: i64) -> Result<Option<AssetRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(&(kind, id)).cloned())
    }

    async fn count_local(&self, kind: AssetKind) -> Result<i64, AppError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .values()
            .filter(|r| r.kind == kind && r.is_local_storage)
            .count() as i64)
    }

    async fn save(&self, record: &AssetRecord) -> Result<(), AppError> {
        let failing = self.failing_saves.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_saves.store(failing - 1, Ordering::SeqCst);
            return Err(AppError::Persistence {
                kind: record.kind,
                id: record.id,
                message: "injected save failure".to_string(),
            });
        }

        self.saves.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .unwrap()
            .insert((record.kind, record.id), record.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobEvent {
    Upload { key: String, path: PathBuf },
    Delete { key: String },
}

/// Blob store that keeps uploaded bytes in memory and records every call.
///
/// Keys containing a registered fragment fail (or hang) instead of succeeding.
pub struct RecordingBlobStore {
    bucket: String,
    objects: Mutex<HashMap<String, Bytes>>,
    events: Mutex<Vec<BlobEvent>>,
    failing: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
    failing_uploads: AtomicUsize,
}

impl RecordingBlobStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            hanging: Mutex::new(HashSet::new()),
            failing_uploads: AtomicUsize::new(0),
        }
    }

    /// Fail every upload or delete whose key contains `fragment`.
    pub fn fail_keys_containing(&self, fragment: &str) {
        self.failing.lock().unwrap().insert(fragment.to_string());
    }

    /// Never complete uploads whose key contains `fragment`.
    pub fn hang_keys_containing(&self, fragment: &str) {
        self.hanging.lock().unwrap().insert(fragment.to_string());
    }

    /// Fail the next `count` uploads regardless of key.
    pub fn fail_next_uploads(&self, count: usize) {
        self.failing_uploads.store(count, Ordering::SeqCst);
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
        self.hanging.lock().unwrap().clear();
        self.failing_uploads.store(0, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<BlobEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BlobEvent::Upload { key, .. } => Some(key),
                BlobEvent::Delete { .. } => None,
            })
            .collect()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BlobEvent::Delete { key } => Some(key),
                BlobEvent::Upload { .. } => None,
            })
            .collect()
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn put_object(&self, key: &str, data: Bytes) {
        self.objects.lock().unwrap().insert(key.to_string(), data);
    }

    fn matches(set: &Mutex<HashSet<String>>, key: &str) -> bool {
        set.lock().unwrap().iter().any(|fragment| key.contains(fragment.as_str()))
    }
}

#[async_trait]
impl BlobStore for RecordingBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_file(&self, local_path: &Path, destination_key: &str) -> StorageResult<UploadedObject> {
        self.events.lock().unwrap().push(BlobEvent::Upload {
            key: destination_key.to_string(),
            path: local_path.to_path_buf(),
        });

        if Self::matches(&self.hanging, destination_key) {
            std::future::pending::<()>().await;
        }
        let failing = self.failing_uploads.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_uploads.store(failing - 1, Ordering::SeqCst);
            return Err(StorageError::UploadFailed("injected transient failure".to_string()));
        }
        if Self::matches(&self.failing, destination_key) {
            return Err(StorageError::UploadFailed(format!("injected failure for {}", destination_key)));
        }

        let data = tokio::fs::read(local_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(local_path.display().to_string())
            } else {
                StorageError::IoError(e)
            }
        })?;
        self.put_object(destination_key, Bytes::from(data));

        Ok(UploadedObject {
            bucket: self.bucket.clone(),
            key: destination_key.to_string(),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.events
            .lock()
            .unwrap()
            .push(BlobEvent::Delete { key: key.to_string() });

        if Self::matches(&self.failing, key) {
            return Err(StorageError::DeleteFailed(format!("injected failure for {}", key)));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Source serving fixed bytes per URL.
#[derive(Default)]
pub struct StaticSource {
    responses: Mutex<HashMap<String, Bytes>>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, data: Bytes) {
        self.responses.lock().unwrap().insert(url.to_string(), data);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetSource for StaticSource {
    async fn fetch(&self, url: &str) -> StorageResult<Bytes> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(url.to_string()))
    }
}

/// Real resizer that refuses one target width.
pub struct FailingResizer {
    pub fail_width: u32,
}

impl Resizer for FailingResizer {
    fn resize_to_fill(&self, data: &[u8], width: u32, height: u32) -> Result<ResizedImage, anyhow::Error> {
        if width == self.fail_width {
            return Err(anyhow::anyhow!("injected resize failure at width {}", width));
        }
        ImageTransformer::resize_to_fill(data, width, height)
    }
}

/// Workspace with local upload roots, an in-memory store and one recording bucket.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config: Config,
    pub store: Arc<InMemoryRecordStore>,
    pub blobs: Arc<RecordingBlobStore>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Build with extra environment entries layered over the defaults.
    pub fn with_env(overrides: &[(&str, &str)]) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("DATABASE_URL".into(), "postgres://localhost/stowage_test".into());
        env.insert("GCS_FILE_BUCKET".into(), BUCKET.into());
        env.insert(
            "FILE_UPLOAD_PATH".into(),
            temp_dir.path().join("files").display().to_string(),
        );
        env.insert(
            "IMAGE_UPLOAD_PATH".into(),
            temp_dir.path().join("images").display().to_string(),
        );
        for (key, value) in overrides {
            env.insert(key.to_string(), value.to_string());
        }

        let config = Config::from_lookup(|key| env.get(key).cloned()).expect("valid test config");

        Self {
            temp_dir,
            config,
            store: Arc::new(InMemoryRecordStore::new()),
            blobs: Arc::new(RecordingBlobStore::new(BUCKET)),
        }
    }

    pub fn blob_stores(&self) -> BlobStores {
        BlobStores {
            files: self.blobs.clone(),
            images: self.blobs.clone(),
        }
    }

    pub fn context(&self) -> MigrationContext {
        MigrationContext::new(self.config.clone(), self.store.clone(), self.blob_stores())
            .with_date(Some(migration_date()))
            .with_retry_base(std::time::Duration::ZERO)
    }

    pub fn local_path(&self, kind: AssetKind, style: &str, name: &str) -> PathBuf {
        let root = self.config.upload.root_for(kind);
        match kind {
            AssetKind::File => root.join(name),
            AssetKind::Image => root.join(style).join(name),
        }
    }

    /// Write a local file and insert its still-local record.
    pub fn add_local_file(&self, id: i64, name: &str) -> PathBuf {
        let path = self.local_path(AssetKind::File, "original", name);
        fixtures::write_file(&path, format!("contents of {}", name).as_bytes());
        self.store.insert(AssetRecord::new_local(
            id,
            AssetKind::File,
            name,
            format!("/api/v1/file-download/{}", name),
        ));
        path
    }

    /// Write one local copy per style and insert the still-local image record.
    pub fn add_local_image(&self, id: i64, name: &str, styles: &[&str]) -> AssetRecord {
        let mut record = AssetRecord::new_local(id, AssetKind::Image, name, format!("/api/v1/image/original/{}", name));
        record.urls.clear();
        for style in styles {
            let path = self.local_path(AssetKind::Image, style, name);
            fixtures::write_file(&path, &fixtures::png_bytes(40, 20));
            record
                .urls
                .insert(style.to_string(), format!("/api/v1/image/{}/{}", style, name));
        }
        self.store.insert(record.clone());
        record
    }
}
