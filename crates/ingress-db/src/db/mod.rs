//! Record store repositories
//!
//! Every backend implements [`RecordStore`]. Inserts are conditional on the id being
//! absent so two workers racing on the same image cannot both write a record.

#[cfg(feature = "dynamodb")]
pub mod dynamo;
pub mod factory;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use ingress_core::models::ImageRecord;
use thiserror::Error;

#[cfg(feature = "dynamodb")]
pub use dynamo::DynamoRecordStore;
pub use factory::create_record_store;
pub use memory::MemoryRecordStore;
#[cfg(feature = "postgres")]
pub use postgres::PgRecordStore;

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Record store backend error: {0}")]
    Backend(String),

    #[error("Stored record is malformed: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RecordStoreResult<T> = Result<T, RecordStoreError>;

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same id was already present; nothing was written.
    AlreadyExists,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// True when a record with `id` exists.
    async fn exists(&self, id: &str) -> RecordStoreResult<bool>;

    /// Write `record` unless its id is already taken.
    async fn insert_if_absent(&self, record: &ImageRecord) -> RecordStoreResult<InsertOutcome>;

    async fn get(&self, id: &str) -> RecordStoreResult<Option<ImageRecord>>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}
