//! In-process record store for local runs and tests.

use super::{InsertOutcome, RecordStore, RecordStoreResult};
use async_trait::async_trait;
use ingress_core::models::ImageRecord;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, ImageRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn exists(&self, id: &str) -> RecordStoreResult<bool> {
        Ok(self.records.read().await.contains_key(id))
    }

    async fn insert_if_absent(&self, record: &ImageRecord) -> RecordStoreResult<InsertOutcome> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        records.insert(record.id.clone(), record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn get(&self, id: &str) -> RecordStoreResult<Option<ImageRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
