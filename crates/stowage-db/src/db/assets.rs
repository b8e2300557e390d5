//! Asset repository: ordered scan and whole-record update over `files` / `images`.
//!
//! `urls` and `extraData` are JSON documents stored as text, the way the upload intake
//! writes them.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use std::collections::BTreeMap;
use stowage_core::{AppError, AssetKind, AssetRecord, ExtraData};

use crate::store_traits::AssetRecordStore;

/// Row type for the asset tables (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct AssetRow {
    pub id: i64,
    pub name: String,
    pub urls: Option<String>,
    #[sqlx(rename = "extraData")]
    pub extra_data: Option<String>,
    #[sqlx(rename = "isLocalStorage")]
    pub is_local_storage: bool,
    #[sqlx(rename = "storageName")]
    pub storage_name: Option<String>,
}

impl AssetRow {
    pub fn into_record(self, kind: AssetKind) -> Result<AssetRecord, AppError> {
        let urls: BTreeMap<String, String> = match self.urls.as_deref() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw).map_err(|e| {
                AppError::Internal(format!("Invalid urls on {} {}: {}", kind, self.id, e))
            })?,
            _ => BTreeMap::new(),
        };

        let extra_data: Option<ExtraData> = match self.extra_data.as_deref() {
            Some(raw) if !raw.trim().is_empty() && raw.trim() != "null" => {
                Some(serde_json::from_str(raw).map_err(|e| {
                    AppError::Internal(format!("Invalid extraData on {} {}: {}", kind, self.id, e))
                })?)
            }
            _ => None,
        };

        Ok(AssetRecord {
            id: self.id,
            kind,
            name: self.name,
            urls,
            extra_data,
            is_local_storage: self.is_local_storage,
            storage_name: self.storage_name,
        })
    }
}

/// Repository for the `files` and `images` tables.
#[derive(Clone)]
pub struct PgAssetRepository {
    pool: PgPool,
}

impl PgAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetRecordStore for PgAssetRepository {
    #[tracing::instrument(skip(self), fields(db.table = kind.table()))]
    async fn find_first_local_after(
        &self,
        kind: AssetKind,
        last_id: i64,
    ) -> Result<Option<AssetRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT id::BIGINT AS id, name, urls, "extraData", "isLocalStorage", "storageName"
            FROM {}
            WHERE id > $1 AND "isLocalStorage" = TRUE
            ORDER BY id ASC
            LIMIT 1
            "#,
            kind.table()
        );

        let row: Option<AssetRow> = sqlx::query_as::<Postgres, AssetRow>(&sql)
            .bind(last_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_record(kind)).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = kind.table()))]
    async fn find(&self, kind: AssetKind, id: i64) -> Result<Option<AssetRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT id::BIGINT AS id, name, urls, "extraData", "isLocalStorage", "storageName"
            FROM {}
            WHERE id = $1
            "#,
            kind.table()
        );

        let row: Option<AssetRow> = sqlx::query_as::<Postgres, AssetRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_record(kind)).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = kind.table()))]
    async fn count_local(&self, kind: AssetKind) -> Result<i64, AppError> {
        let sql = format!(
            r#"SELECT COUNT(*) FROM {} WHERE "isLocalStorage" = TRUE"#,
            kind.table()
        );

        let count: i64 = sqlx::query_scalar::<Postgres, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    #[tracing::instrument(skip(self, record), fields(db.table = record.kind.table(), db.record_id = record.id))]
    async fn save(&self, record: &AssetRecord) -> Result<(), AppError> {
        let persistence = |message: String| AppError::Persistence {
            kind: record.kind,
            id: record.id,
            message,
        };

        let urls = serde_json::to_string(&record.urls).map_err(|e| persistence(e.to_string()))?;
        let extra_data = record
            .extra_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| persistence(e.to_string()))?;

        let sql = format!(
            r#"
            UPDATE {}
            SET urls = $1, "extraData" = $2, "isLocalStorage" = $3, "storageName" = $4,
                "updatedAt" = NOW()
            WHERE id = $5
            "#,
            record.kind.table()
        );

        let result = sqlx::query::<Postgres>(&sql)
            .bind(&urls)
            .bind(&extra_data)
            .bind(record.is_local_storage)
            .bind(&record.storage_name)
            .bind(record.id)
            .execute(&self.pool)
            .await
            .map_err(|e| persistence(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(persistence("record no longer exists".to_string()));
        }

        Ok(())
    }
}
