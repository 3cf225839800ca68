use super::{MemoryRecordStore, RecordStore, RecordStoreError, RecordStoreResult};
use ingress_core::{Config, RecordStoreBackend};
use std::sync::Arc;

/// Create the record store selected by `RECORD_STORE`.
pub async fn create_record_store(config: &Config) -> RecordStoreResult<Arc<dyn RecordStore>> {
    match config.record_store() {
        #[cfg(feature = "dynamodb")]
        RecordStoreBackend::DynamoDb => {
            let table = config
                .table_name()
                .map(String::from)
                .ok_or_else(|| {
                    RecordStoreError::ConfigError("TABLE_NAME not configured".to_string())
                })?;
            let store = super::DynamoRecordStore::connect(config.s3_region(), table).await;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "dynamodb"))]
        RecordStoreBackend::DynamoDb => Err(RecordStoreError::ConfigError(
            "DynamoDB record store not available (dynamodb feature not enabled)".to_string(),
        )),

        #[cfg(feature = "postgres")]
        RecordStoreBackend::Postgres => {
            let url = config.database_url().ok_or_else(|| {
                RecordStoreError::ConfigError("DATABASE_URL not configured".to_string())
            })?;
            let store = super::PgRecordStore::connect(url).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "postgres"))]
        RecordStoreBackend::Postgres => Err(RecordStoreError::ConfigError(
            "PostgreSQL record store not available (postgres feature not enabled)".to_string(),
        )),

        RecordStoreBackend::Memory => {
            tracing::warn!("Using in-memory record store; records are lost on exit");
            Ok(Arc::new(MemoryRecordStore::new()))
        }
    }
}
