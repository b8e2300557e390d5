use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend labels
///
/// The label is persisted in a record's `storage_name` column once its artifacts
/// live in the object store, so the serving layer knows which backend to ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageName {
    GcsFile,
    GcsImage,
}

impl StorageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageName::GcsFile => "gcs_file",
            StorageName::GcsImage => "gcs_image",
        }
    }
}

impl FromStr for StorageName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcs_file" => Ok(StorageName::GcsFile),
            "gcs_image" => Ok(StorageName::GcsImage),
            _ => Err(anyhow::anyhow!("Invalid storage name: {}", s)),
        }
    }
}

impl Display for StorageName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
