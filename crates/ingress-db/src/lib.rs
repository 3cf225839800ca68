//! Ingress record store
//!
//! Persistence for [`ImageRecord`](ingress_core::models::ImageRecord)s keyed by the
//! crop-resistant hash. DynamoDB is the production backend; PostgreSQL and an
//! in-memory store are available for self-hosted runs and tests.

pub mod db;

pub use db::{
    create_record_store, InsertOutcome, MemoryRecordStore, RecordStore, RecordStoreError,
    RecordStoreResult,
};
#[cfg(feature = "dynamodb")]
pub use db::DynamoRecordStore;
#[cfg(feature = "postgres")]
pub use db::PgRecordStore;
