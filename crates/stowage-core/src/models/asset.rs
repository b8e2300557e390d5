use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::constants::ORIGINAL_STYLE;
use crate::storage_types::StorageName;

/// The two record collections handled by the pipeline.
///
/// Both share one record shape; they differ in table, bucket, local path layout,
/// and the storage label written once migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    File,
    Image,
}

impl AssetKind {
    pub fn table(&self) -> &'static str {
        match self {
            AssetKind::File => "files",
            AssetKind::Image => "images",
        }
    }

    pub fn storage_name(&self) -> StorageName {
        match self {
            AssetKind::File => StorageName::GcsFile,
            AssetKind::Image => StorageName::GcsImage,
        }
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AssetKind::File => write!(f, "file"),
            AssetKind::Image => write!(f, "image"),
        }
    }
}

/// Bookkeeping stored next to a record's URLs.
///
/// `keys` maps each style to the object key holding that style's bytes; the destroy
/// workflow reads it to know which remote objects to remove. Fields written by other
/// parts of the system are kept in `other` so a save never drops them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraData {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "public_id")]
    pub public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: i64,
    pub kind: AssetKind,
    pub name: String,
    pub urls: BTreeMap<String, String>,
    pub extra_data: Option<ExtraData>,
    pub is_local_storage: bool,
    pub storage_name: Option<String>,
}

impl AssetRecord {
    /// A freshly uploaded, still-local record with a single `original` style.
    pub fn new_local(id: i64, kind: AssetKind, name: impl Into<String>, url: impl Into<String>) -> Self {
        let mut urls = BTreeMap::new();
        urls.insert(ORIGINAL_STYLE.to_string(), url.into());
        Self {
            id,
            kind,
            name: name.into(),
            urls,
            extra_data: None,
            is_local_storage: true,
            storage_name: None,
        }
    }

    pub fn url(&self, style: &str) -> Option<&str> {
        self.urls.get(style).map(String::as_str)
    }

    pub fn key(&self, style: &str) -> Option<&str> {
        self.extra_data
            .as_ref()
            .and_then(|extra| extra.keys.get(style))
            .map(String::as_str)
    }

    /// Extra data, created on first write.
    pub fn extra_data_mut(&mut self) -> &mut ExtraData {
        self.extra_data.get_or_insert_with(ExtraData::default)
    }

    /// Point `style` at a remote object: rewrite its URL and record its key.
    pub fn set_remote_style(&mut self, style: &str, url: String, key: String) {
        self.urls.insert(style.to_string(), url);
        self.extra_data_mut().keys.insert(style.to_string(), key);
    }

    /// Styles whose URL is still served by the local delivery route.
    pub fn local_styles(&self, local_prefix: &str) -> Vec<String> {
        self.urls
            .iter()
            .filter(|(_, url)| url.starts_with(local_prefix))
            .map(|(style, _)| style.clone())
            .collect()
    }

    pub fn has_local_urls(&self, local_prefix: &str) -> bool {
        self.urls.values().any(|url| url.starts_with(local_prefix))
    }

    /// Every object key recorded for this asset, in style order.
    pub fn remote_keys(&self) -> Vec<String> {
        self.extra_data
            .as_ref()
            .map(|extra| extra.keys.values().cloned().collect())
            .unwrap_or_default()
    }
}
