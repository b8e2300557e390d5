//! Image style derivation integration tests.
//!
//! Run with: `cargo test -p stowage-services --test derivatives_test`

mod helpers;

use bytes::Bytes;
use helpers::fixtures::{decoded_dimensions, png_bytes};
use helpers::{FailingResizer, StaticSource, TestEnv};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use stowage_core::{AppError, AssetKind, AssetRecord, StyleConfig};
use stowage_processing::{ImageTransformer, Resizer};
use stowage_services::{AssetBackend, DerivativeCapability, DerivativeGenerator, ImageBackend, RecordLocks};
use tempfile::TempDir;

const ORIGINAL_URL: &str = "https://storage.googleapis.com/my-bucket/2023/05/01/original/abc.png";

fn migrated_image(env: &TestEnv) -> AssetRecord {
    let mut record = AssetRecord::new_local(7, AssetKind::Image, "abc.png", ORIGINAL_URL);
    record.extra_data_mut().keys.insert(
        "original".to_string(),
        "2023/05/01/original/abc.png".to_string(),
    );
    record.is_local_storage = false;
    record.storage_name = Some("gcs_image".to_string());
    env.store.insert(record.clone());
    record
}

fn source_with_original() -> Arc<StaticSource> {
    let source = Arc::new(StaticSource::new());
    source.serve(ORIGINAL_URL, Bytes::from(png_bytes(400, 200)));
    source
}

fn generator(env: &TestEnv, source: Arc<StaticSource>, resizer: Arc<dyn Resizer>, temp: &TempDir) -> DerivativeGenerator {
    DerivativeGenerator::new(env.blobs.clone(), source, resizer, 3, Duration::from_secs(5))
        .with_temp_dir(temp.path())
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

#[tokio::test]
async fn test_all_styles_generated_at_exact_size() {
    let env = TestEnv::new();
    let temp = tempfile::tempdir().unwrap();
    let mut record = migrated_image(&env);
    let generator = generator(&env, source_with_original(), Arc::new(ImageTransformer), &temp);

    let report = generator
        .generate_styles(&mut record, &env.config.image_styles)
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.succeeded, vec!["thumbnail", "medium", "large"]);
    for (style, size) in [("thumbnail", 75), ("medium", 250), ("large", 640)] {
        let key = format!("{}/abc.png", style);
        let data = env.blobs.object(&key).unwrap();
        assert_eq!(decoded_dimensions(&data), (size, size));
        assert_eq!(
            record.url(style),
            Some(format!("https://storage.googleapis.com/my-bucket/{}", key).as_str())
        );
        assert_eq!(record.key(style), Some(key.as_str()));
    }
    assert_eq!(record.url("original"), Some(ORIGINAL_URL));
    assert!(is_empty_dir(temp.path()));
}

#[tokio::test]
async fn test_failing_style_does_not_affect_others() {
    let env = TestEnv::new();
    let temp = tempfile::tempdir().unwrap();
    let mut record = migrated_image(&env);
    let generator = generator(
        &env,
        source_with_original(),
        Arc::new(FailingResizer { fail_width: 250 }),
        &temp,
    );

    let report = generator
        .generate_styles(&mut record, &env.config.image_styles)
        .await
        .unwrap();

    assert_eq!(report.succeeded, vec!["thumbnail", "large"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].style, "medium");
    assert!(matches!(report.first_error(), Some(AppError::ImageProcessing(_))));
    assert!(record.url("medium").is_none());
    assert!(record.url("thumbnail").is_some());
    assert!(record.url("large").is_some());

    let mut uploaded = env.blobs.uploaded_keys();
    uploaded.sort();
    assert_eq!(uploaded, vec!["large/abc.png", "thumbnail/abc.png"]);
    assert!(is_empty_dir(temp.path()));
}

#[tokio::test]
async fn test_failed_upload_still_removes_intermediate_file() {
    let env = TestEnv::new();
    let temp = tempfile::tempdir().unwrap();
    let mut record = migrated_image(&env);
    env.blobs.fail_keys_containing("large/");
    let generator = generator(&env, source_with_original(), Arc::new(ImageTransformer), &temp);

    let report = generator
        .generate_styles(&mut record, &env.config.image_styles)
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(matches!(report.first_error(), Some(AppError::Upload { .. })));
    assert!(is_empty_dir(temp.path()));

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, AppError::Upload { .. }));
}

#[tokio::test]
async fn test_invalid_style_fails_before_any_work() {
    let env = TestEnv::new();
    let temp = tempfile::tempdir().unwrap();
    let mut record = migrated_image(&env);
    let source = source_with_original();
    let generator = generator(&env, source.clone(), Arc::new(ImageTransformer), &temp);

    let styles = vec![
        StyleConfig::new("thumbnail", 75, 75),
        StyleConfig::new("broken", -1, 75),
    ];
    let err = generator.generate_styles(&mut record, &styles).await.unwrap_err();

    assert!(matches!(err, AppError::Configuration(_)));
    assert_eq!(source.fetches(), 0);
    assert!(env.blobs.events().is_empty());
}

#[tokio::test]
async fn test_style_named_original_cannot_overwrite_original() {
    let env = TestEnv::new();
    let temp = tempfile::tempdir().unwrap();
    let mut record = migrated_image(&env);
    let source = source_with_original();
    let generator = generator(&env, source.clone(), Arc::new(ImageTransformer), &temp);

    let styles = vec![StyleConfig::new("original", 75, 75)];
    let err = generator.generate_styles(&mut record, &styles).await.unwrap_err();

    assert!(matches!(err, AppError::Configuration(_)));
    assert_eq!(source.fetches(), 0);
    assert_eq!(record.url("original"), Some(ORIGINAL_URL));
    assert_eq!(record.key("original"), Some("2023/05/01/original/abc.png"));
}

#[tokio::test]
async fn test_unreadable_original_fails_whole_operation() {
    let env = TestEnv::new();
    let temp = tempfile::tempdir().unwrap();
    let mut record = migrated_image(&env);
    let generator = generator(&env, Arc::new(StaticSource::new()), Arc::new(ImageTransformer), &temp);

    let err = generator
        .generate_styles(&mut record, &env.config.image_styles)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Download { .. }));
    assert!(env.blobs.events().is_empty());
}

#[tokio::test]
async fn test_local_original_is_rejected() {
    let env = TestEnv::new();
    let temp = tempfile::tempdir().unwrap();
    let mut record = env.add_local_image(8, "local.png", &["original"]);
    let source = source_with_original();
    let generator = generator(&env, source.clone(), Arc::new(ImageTransformer), &temp);

    let err = generator
        .generate_styles(&mut record, &env.config.image_styles)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(source.fetches(), 0);
}

#[tokio::test]
async fn test_image_backend_saves_generated_styles() {
    let env = TestEnv::new();
    let temp = tempfile::tempdir().unwrap();
    let mut record = migrated_image(&env);
    let backend = ImageBackend::new(
        env.blobs.clone(),
        env.store.clone(),
        generator(&env, source_with_original(), Arc::new(ImageTransformer), &temp),
        env.config.image_styles.clone(),
        RecordLocks::new(),
    );

    let capability = backend.derivatives().expect("images derive styles");
    let report = capability.generate_image_styles(&mut record).await.unwrap();

    assert_eq!(report.succeeded.len(), 3);
    assert_eq!(env.store.saves(), 1);
    let stored = env.store.get(AssetKind::Image, 7);
    assert_eq!(stored, record);
    assert_eq!(stored.key("thumbnail"), Some("thumbnail/abc.png"));
    assert_eq!(stored.key("original"), Some("2023/05/01/original/abc.png"));
}
