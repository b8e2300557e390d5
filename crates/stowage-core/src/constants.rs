//! Shared constants

/// Style name of the canonical artifact every record starts with.
pub const ORIGINAL_STYLE: &str = "original";

/// Public host that serves Google Cloud Storage objects over HTTPS.
pub const GCS_PUBLIC_HOST: &str = "https://storage.googleapis.com";

/// Value written to `extraData.storageClass` for objects held in GCS.
pub const GCS_STORAGE_CLASS: &str = "gcp";

/// URL prefix used by the local delivery route.
pub const DEFAULT_LOCAL_URL_PREFIX: &str = "/api/v1";

/// Date layout of the migration key prefix (`YYYY/MM/DD`).
pub const DATE_PREFIX_FORMAT: &str = "%Y/%m/%d";

/// Date layout accepted on the command line (`DD/MM/YYYY`).
pub const CLI_DATE_FORMAT: &str = "%d/%m/%Y";
