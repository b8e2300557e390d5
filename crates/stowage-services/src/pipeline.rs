//! Migration pipeline
//!
//! Stages run in order over one shared context: files first, then images. A
//! collection with nothing to migrate is reported and skipped; any other failure
//! stops the pipeline.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stowage_core::{AppError, AssetKind, Config};
use stowage_db::{create_pool, AssetRecordStore, PgAssetRepository};
use stowage_processing::ImageTransformer;
use stowage_storage::{create_blob_stores, AssetSource, BlobStores, LocalUploadRoot};

use crate::backends::{AssetBackend, FileBackend, ImageBackend};
use crate::derivatives::DerivativeGenerator;
use crate::locks::RecordLocks;
use crate::migration::{AssetMigrator, CollectionReport, MigrationRunner, RetryPolicy};

const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MigrateFiles,
    MigrateImages,
}

impl Stage {
    pub const ALL: [Stage; 2] = [Stage::MigrateFiles, Stage::MigrateImages];

    pub fn kind(&self) -> AssetKind {
        match self {
            Stage::MigrateFiles => AssetKind::File,
            Stage::MigrateImages => AssetKind::Image,
        }
    }
}

/// Ids to resume each collection after
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumePoints {
    pub files: i64,
    pub images: i64,
}

impl ResumePoints {
    pub fn for_kind(&self, kind: AssetKind) -> i64 {
        match kind {
            AssetKind::File => self.files,
            AssetKind::Image => self.images,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub collections: Vec<CollectionReport>,
}

impl RunReport {
    pub fn collection(&self, kind: AssetKind) -> Option<&CollectionReport> {
        self.collections.iter().find(|report| report.kind == kind)
    }

    pub fn records_migrated(&self) -> usize {
        self.collections.iter().map(|report| report.migrated).sum()
    }

    pub fn styles_uploaded(&self) -> usize {
        self.collections.iter().map(|report| report.styles_uploaded).sum()
    }
}

/// Everything the stages share: configuration, record store, blob stores and locks.
pub struct MigrationContext {
    pub config: Config,
    pub store: Arc<dyn AssetRecordStore>,
    pub blobs: BlobStores,
    pub locks: RecordLocks,
    pub date: Option<NaiveDate>,
    pub resume: ResumePoints,
    retry_base: Duration,
}

impl MigrationContext {
    pub fn new(config: Config, store: Arc<dyn AssetRecordStore>, blobs: BlobStores) -> Self {
        Self {
            config,
            store,
            blobs,
            locks: RecordLocks::new(),
            date: None,
            resume: ResumePoints::default(),
            retry_base: DEFAULT_RETRY_BASE,
        }
    }

    /// Validate configuration, then open the database pool and object store clients.
    pub async fn connect(config: Config) -> Result<Self, AppError> {
        config.validate()?;

        let pool = create_pool(&config.database_url, config.db_max_connections).await?;
        let store: Arc<dyn AssetRecordStore> = Arc::new(PgAssetRepository::new(pool));
        let blobs = create_blob_stores(&config.gcs)
            .map_err(|e| AppError::Configuration(format!("object store: {}", e)))?;

        Ok(Self::new(config, store, blobs))
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn with_resume(mut self, resume: ResumePoints) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    pub fn migrator(&self, kind: AssetKind) -> AssetMigrator {
        AssetMigrator::new(
            kind,
            self.store.clone(),
            self.blobs.for_kind(kind),
            LocalUploadRoot::new(self.config.upload.root_for(kind).clone(), kind),
            self.config.upload.local_url_prefix.clone(),
            self.config.gcs.upload_timeout,
            self.locks.clone(),
        )
        .with_date(self.date)
    }

    pub fn runner(&self, kind: AssetKind) -> MigrationRunner {
        MigrationRunner::new(self.store.clone(), self.migrator(kind)).with_retry(RetryPolicy::new(
            self.config.migration_max_attempts,
            self.retry_base,
        ))
    }

    /// Backend for one collection. `source` reads originals back for style derivation.
    pub fn backend(&self, kind: AssetKind, source: Arc<dyn AssetSource>) -> Box<dyn AssetBackend> {
        match kind {
            AssetKind::File => Box::new(FileBackend::new(self.blobs.files.clone())),
            AssetKind::Image => {
                let generator = DerivativeGenerator::new(
                    self.blobs.images.clone(),
                    source,
                    Arc::new(ImageTransformer),
                    self.config.derivative_concurrency,
                    self.config.gcs.upload_timeout,
                );
                Box::new(ImageBackend::new(
                    self.blobs.images.clone(),
                    self.store.clone(),
                    generator,
                    self.config.image_styles.clone(),
                    self.locks.clone(),
                ))
            }
        }
    }

    pub async fn run_stage(&self, stage: Stage) -> Result<CollectionReport, AppError> {
        let kind = stage.kind();
        self.runner(kind).run_from(self.resume.for_kind(kind)).await
    }

    /// Run every stage in order.
    pub async fn run(&self) -> Result<RunReport, AppError> {
        let start = Instant::now();
        let mut report = RunReport::default();

        for stage in Stage::ALL {
            tracing::info!(stage = ?stage, "Starting stage");
            report.collections.push(self.run_stage(stage).await?);
        }

        tracing::info!(
            records_migrated = report.records_migrated(),
            styles_uploaded = report.styles_uploaded(),
            duration_ms = start.elapsed().as_millis(),
            "Migration finished"
        );
        Ok(report)
    }
}

/// Migrate every local file and image to object storage.
///
/// `date` fixes the key prefix date; the current UTC date is used otherwise. Each
/// collection's walk starts after the id given in `resume`.
pub async fn run_migration(
    config: Config,
    date: Option<NaiveDate>,
    resume: ResumePoints,
) -> Result<RunReport, AppError> {
    MigrationContext::connect(config)
        .await?
        .with_date(date)
        .with_resume(resume)
        .run()
        .await
}
