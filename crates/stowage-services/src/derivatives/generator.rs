use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use stowage_core::constants::ORIGINAL_STYLE;
use stowage_core::{AppError, AssetRecord, StyleConfig};
use stowage_processing::Resizer;
use stowage_storage::keys::derivative_key;
use stowage_storage::{AssetSource, BlobStore, UploadedObject};
use tempfile::NamedTempFile;

use crate::logging::log_app_error;
use crate::upload::upload_with_timeout;

#[derive(Debug)]
pub struct StyleFailure {
    pub style: String,
    pub error: AppError,
}

/// Per-style outcome of one generation pass
#[derive(Debug, Default)]
pub struct DerivativeReport {
    /// Styles now stored remotely, in configuration order
    pub succeeded: Vec<String>,
    /// Failed styles, in the order they failed
    pub failed: Vec<StyleFailure>,
}

impl DerivativeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// The first failure encountered, if any
    pub fn first_error(&self) -> Option<&AppError> {
        self.failed.first().map(|failure| &failure.error)
    }

    /// Collapse into the aggregate result: the first failure, or the styles produced.
    pub fn into_result(self) -> Result<Vec<String>, AppError> {
        match self.failed.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.succeeded),
        }
    }
}

/// Renders configured styles of an image and uploads them next to the original.
pub struct DerivativeGenerator {
    blobs: Arc<dyn BlobStore>,
    source: Arc<dyn AssetSource>,
    resizer: Arc<dyn Resizer>,
    concurrency: usize,
    upload_timeout: Duration,
    temp_dir: Option<PathBuf>,
}

impl DerivativeGenerator {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        source: Arc<dyn AssetSource>,
        resizer: Arc<dyn Resizer>,
        concurrency: usize,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            blobs,
            source,
            resizer,
            concurrency: concurrency.max(1),
            upload_timeout,
            temp_dir: None,
        }
    }

    /// Write intermediate files under `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Render every style in `styles` from the record's `original` and upload them.
    ///
    /// Styles are validated before any work starts. The original is fetched once;
    /// styles then run concurrently and independently, so one failing style does not
    /// stop the others. Successful styles are written into `record` after all of them
    /// finish; the caller decides when to save.
    #[tracing::instrument(skip(self, record, styles), fields(record_id = record.id, name = %record.name))]
    pub async fn generate_styles(
        &self,
        record: &mut AssetRecord,
        styles: &[StyleConfig],
    ) -> Result<DerivativeReport, AppError> {
        for style in styles {
            style.validate()?;
        }
        if styles.is_empty() {
            return Ok(DerivativeReport::default());
        }

        let start = Instant::now();
        let original_url = record
            .url(ORIGINAL_STYLE)
            .ok_or_else(|| AppError::Internal(format!("image {} has no original URL", record.id)))?
            .to_string();
        if !original_url.starts_with("http://") && !original_url.starts_with("https://") {
            return Err(AppError::Internal(format!(
                "image {} original is not stored remotely: {}",
                record.id, original_url
            )));
        }

        let original = self
            .source
            .fetch(&original_url)
            .await
            .map_err(|e| AppError::Download {
                url: original_url.clone(),
                message: e.to_string(),
            })?;

        let name = record.name.clone();
        let futures: Vec<_> = styles
            .iter()
            .enumerate()
            .map(|(index, style)| {
                let original = original.clone();
                let name = name.as_str();
                async move { (index, self.render_style(original, name, style).await) }
            })
            .collect();
        let outcomes: Vec<(usize, Result<UploadedObject, AppError>)> =
            stream::iter(futures)
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut uploaded = Vec::new();
        let mut report = DerivativeReport::default();
        for (index, outcome) in outcomes {
            let style = &styles[index];
            match outcome {
                Ok(object) => uploaded.push((index, object)),
                Err(error) => {
                    log_app_error(&error, &format!("Style {} generation failed", style.name));
                    report.failed.push(StyleFailure {
                        style: style.name.clone(),
                        error,
                    });
                }
            }
        }

        uploaded.sort_by_key(|(index, _)| *index);
        for (index, object) in uploaded {
            let style = &styles[index].name;
            record.set_remote_style(style, object.public_url(), object.key);
            report.succeeded.push(style.clone());
        }

        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            duration_ms = start.elapsed().as_millis(),
            "Image styles generated"
        );

        Ok(report)
    }

    async fn render_style(
        &self,
        original: Bytes,
        name: &str,
        style: &StyleConfig,
    ) -> Result<UploadedObject, AppError> {
        let key = derivative_key(&style.name, name)
            .map_err(|e| AppError::Internal(format!("style {}: {}", style.name, e)))?;
        let (width, height) = style.dimensions()?;
        let resizer = self.resizer.clone();
        let prefix = format!("gcs_{}_{}_", name, style.name);
        let temp_dir = self.temp_dir.clone();
        let style_name = style.name.clone();

        let temp = tokio::task::spawn_blocking(move || -> Result<NamedTempFile, AppError> {
            let resized = resizer.resize_to_fill(&original, width, height).map_err(|e| {
                AppError::ImageProcessing(format!("style {}: {}", style_name, e))
            })?;

            let mut builder = tempfile::Builder::new();
            builder.prefix(&prefix);
            let mut temp = match temp_dir {
                Some(dir) => builder.tempfile_in(dir)?,
                None => builder.tempfile()?,
            };
            temp.write_all(&resized.data)?;
            temp.flush()?;
            Ok(temp)
        })
        .await
        .map_err(|e| AppError::Internal(format!("resize task failed: {}", e)))??;

        let result = upload_with_timeout(self.blobs.as_ref(), temp.path(), &key, self.upload_timeout).await;

        if let Err(e) = temp.close() {
            tracing::warn!(style = %style.name, error = %e, "Failed to remove intermediate file");
        }

        if let Ok(object) = &result {
            tracing::debug!(style = %style.name, key = %object.key, "Style uploaded");
        }
        result
    }
}
