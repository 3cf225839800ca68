//! PostgreSQL record store: one row per image in `image_records`.

use super::{InsertOutcome, RecordStore, RecordStoreError, RecordStoreResult};
use async_trait::async_trait;
use ingress_core::models::{FingerprintSet, ImageRecord};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Row type for image_records table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct ImageRecordRow {
    pub id: String,
    pub classification: String,
    pub link: String,
    pub hashes: Json<BTreeMap<String, String>>,
    pub dataset_origin: String,
    pub dataset_origin_json: Json<BTreeMap<String, String>>,
    pub filename: String,
    pub group: String,
    pub data_source: String,
}

impl ImageRecordRow {
    pub fn to_image_record(self) -> RecordStoreResult<ImageRecord> {
        let hashes = FingerprintSet::from_attributes(&self.hashes.0).ok_or_else(|| {
            RecordStoreError::InvalidRecord(format!("incomplete hashes for {}", self.id))
        })?;

        Ok(ImageRecord {
            id: self.id,
            classification: self.classification,
            link: self.link,
            hashes,
            dataset_origin: self.dataset_origin,
            dataset_origin_json: self.dataset_origin_json.0,
            filename: self.filename,
            group: self.group,
            data_source: self.data_source,
        })
    }
}

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply pending migrations from the workspace `migrations/` directory.
    pub async fn connect(database_url: &str) -> RecordStoreResult<Self> {
        tracing::info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await?;

        let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
        let migrator = sqlx::migrate::Migrator::new(migrations_dir)
            .await
            .map_err(|e| {
                RecordStoreError::ConfigError(format!("Failed to load migrations: {}", e))
            })?;
        migrator
            .run(&pool)
            .await
            .map_err(|e| RecordStoreError::Backend(format!("Failed to run migrations: {}", e)))?;
        tracing::info!("Database migrations applied");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    #[tracing::instrument(skip(self), fields(db.table = "image_records"))]
    async fn exists(&self, id: &str) -> RecordStoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM image_records WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    #[tracing::instrument(
        skip(self, record),
        fields(db.table = "image_records", db.record_id = %record.id)
    )]
    async fn insert_if_absent(&self, record: &ImageRecord) -> RecordStoreResult<InsertOutcome> {
        let result = sqlx::query::<Postgres>(
            r#"
            INSERT INTO image_records
                (id, classification, link, hashes, dataset_origin, dataset_origin_json,
                 filename, "group", data_source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&record.id)
        .bind(&record.classification)
        .bind(&record.link)
        .bind(Json(record.hashes.to_attributes()))
        .bind(&record.dataset_origin)
        .bind(Json(&record.dataset_origin_json))
        .bind(&record.filename)
        .bind(&record.group)
        .bind(&record.data_source)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "image_records"))]
    async fn get(&self, id: &str) -> RecordStoreResult<Option<ImageRecord>> {
        let row: Option<ImageRecordRow> = sqlx::query_as::<Postgres, ImageRecordRow>(
            r#"
            SELECT id, classification, link, hashes, dataset_origin, dataset_origin_json,
                   filename, "group", data_source
            FROM image_records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ImageRecordRow::to_image_record).transpose()
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(hashes: BTreeMap<String, String>) -> ImageRecordRow {
        ImageRecordRow {
            id: "abcd".to_string(),
            classification: "cat".to_string(),
            link: "https://example.com/a.png".to_string(),
            hashes: Json(hashes),
            dataset_origin: "web".to_string(),
            dataset_origin_json: Json(BTreeMap::from([(
                "classification".to_string(),
                "cat".to_string(),
            )])),
            filename: "x_cat.jpeg".to_string(),
            group: "".to_string(),
            data_source: "url".to_string(),
        }
    }

    #[test]
    fn row_converts_to_record() {
        let hashes = FingerprintSet {
            crop_resistant_hash: "abcd".to_string(),
            perceptual_hash: "1234".to_string(),
            color_hash: "00".to_string(),
        };
        let record = row(hashes.to_attributes()).to_image_record().unwrap();
        assert_eq!(record.hashes, hashes);
        assert_eq!(record.dataset_origin_json["classification"], "cat");
    }

    #[test]
    fn row_with_partial_hashes_is_invalid() {
        let hashes = BTreeMap::from([("p_hash".to_string(), "1234".to_string())]);
        assert!(matches!(
            row(hashes).to_image_record(),
            Err(RecordStoreError::InvalidRecord(_))
        ));
    }
}
