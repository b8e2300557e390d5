use std::path::Path;
use std::time::Duration;
use stowage_core::AppError;
use stowage_storage::{BlobStore, StorageError, UploadedObject};

/// Upload with a per-call deadline, translated into pipeline errors.
///
/// A missing source file is not an upload failure: retrying cannot bring it back.
pub(crate) async fn upload_with_timeout(
    blobs: &dyn BlobStore,
    local_path: &Path,
    key: &str,
    timeout: Duration,
) -> Result<UploadedObject, AppError> {
    match tokio::time::timeout(timeout, blobs.upload_file(local_path, key)).await {
        Ok(Ok(uploaded)) => Ok(uploaded),
        Ok(Err(StorageError::NotFound(path))) => Err(AppError::MissingLocalFile { path }),
        Ok(Err(e)) => Err(AppError::Upload {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Err(AppError::UploadTimeout {
            key: key.to_string(),
            seconds: timeout.as_secs(),
        }),
    }
}
