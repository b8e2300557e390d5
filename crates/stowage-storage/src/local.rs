use crate::keys::validate_segment;
use crate::traits::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use stowage_core::AssetKind;
use tokio::fs;

/// Local upload root for one record collection
///
/// Files are stored flat (`{root}/{name}`); images keep one directory per style
/// (`{root}/{style}/{name}`).
#[derive(Debug, Clone)]
pub struct LocalUploadRoot {
    root: PathBuf,
    kind: AssetKind,
}

impl LocalUploadRoot {
    pub fn new(root: impl Into<PathBuf>, kind: AssetKind) -> Self {
        Self {
            root: root.into(),
            kind,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the local copy of `style` for the asset `name`.
    ///
    /// Rejects segments containing path separators or `..` so a record can never
    /// point outside the root.
    pub fn path_for(&self, style: &str, name: &str) -> StorageResult<PathBuf> {
        validate_segment(name)?;
        match self.kind {
            AssetKind::File => Ok(self.root.join(name)),
            AssetKind::Image => {
                validate_segment(style)?;
                Ok(self.root.join(style).join(name))
            }
        }
    }

    /// Remove a local copy.
    ///
    /// Returns `Ok(false)` when the file was already gone.
    pub async fn remove(&self, path: &Path) -> StorageResult<bool> {
        if path.strip_prefix(&self.root).is_err() {
            return Err(StorageError::InvalidKey(format!(
                "{} is outside {}",
                path.display(),
                self.root.display()
            )));
        }

        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_layout_is_flat() {
        let root = LocalUploadRoot::new("/srv/uploads/files", AssetKind::File);
        assert_eq!(
            root.path_for("original", "abc.png").unwrap(),
            PathBuf::from("/srv/uploads/files/abc.png")
        );
    }

    #[test]
    fn test_image_layout_has_style_directory() {
        let root = LocalUploadRoot::new("/srv/uploads/images", AssetKind::Image);
        assert_eq!(
            root.path_for("thumbnail", "abc.png").unwrap(),
            PathBuf::from("/srv/uploads/images/thumbnail/abc.png")
        );
    }

    #[test]
    fn test_path_traversal_rejected() {
        let root = LocalUploadRoot::new("/srv/uploads/images", AssetKind::Image);
        assert!(matches!(
            root.path_for("original", "../../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            root.path_for("..", "abc.png"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_existing_and_missing() {
        let dir = tempdir().unwrap();
        let root = LocalUploadRoot::new(dir.path(), AssetKind::File);
        let path = root.path_for("original", "abc.png").unwrap();
        tokio::fs::write(&path, b"data").await.unwrap();

        assert!(root.remove(&path).await.unwrap());
        assert!(!path.exists());
        assert!(!root.remove(&path).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_outside_root_rejected() {
        let dir = tempdir().unwrap();
        let root = LocalUploadRoot::new(dir.path().join("files"), AssetKind::File);
        let result = root.remove(&dir.path().join("other.png")).await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
