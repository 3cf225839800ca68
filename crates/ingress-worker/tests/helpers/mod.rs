//! Test helpers: an orchestrator wired to local storage, local source buckets and
//! the in-memory record store, all under one temp dir.

pub mod fixtures;

use ingress_core::PipelineSettings;
use ingress_db::{MemoryRecordStore, RecordStore};
use ingress_storage::{LocalBucketReader, LocalStorage};
use ingress_worker::{Orchestrator, WorkerContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestPipeline {
    pub orchestrator: Orchestrator,
    pub records: Arc<MemoryRecordStore>,
    pub _temp_dir: TempDir,
    pub derivatives: PathBuf,
    pub buckets: PathBuf,
    pub scratch: PathBuf,
}

pub fn settings(scratch: &Path) -> PipelineSettings {
    PipelineSettings {
        http_timeout: Duration::from_secs(5),
        scratch_dir: scratch.to_path_buf(),
        ..PipelineSettings::default()
    }
}

pub async fn setup_pipeline() -> TestPipeline {
    let records = Arc::new(MemoryRecordStore::new());
    setup_pipeline_with_records(records.clone(), records).await
}

/// Pipeline whose orchestrator uses `store`; `records` is kept for inspection.
pub async fn setup_pipeline_with_records(
    store: Arc<dyn RecordStore>,
    records: Arc<MemoryRecordStore>,
) -> TestPipeline {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let derivatives = temp_dir.path().join("derivatives");
    let buckets = temp_dir.path().join("buckets");
    let scratch = temp_dir.path().join("scratch");

    let storage = LocalStorage::new(&derivatives)
        .await
        .expect("Failed to create local storage");
    let reader = LocalBucketReader::new(&buckets);

    let ctx = WorkerContext::new(
        Arc::new(storage),
        Arc::new(reader),
        store,
        settings(&scratch),
    )
    .expect("Failed to build worker context");

    TestPipeline {
        orchestrator: Orchestrator::new(ctx),
        records,
        _temp_dir: temp_dir,
        derivatives,
        buckets,
        scratch,
    }
}

impl TestPipeline {
    /// Relative keys of every stored derivative.
    pub fn derivative_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_files(&self.derivatives, &self.derivatives, &mut keys);
        keys.sort();
        keys
    }

    pub fn scratch_is_empty(&self) -> bool {
        match std::fs::read_dir(&self.scratch) {
            Ok(mut entries) => entries.next().is_none(),
            Err(_) => true,
        }
    }

    /// Place an object into a local source bucket.
    pub fn put_source_object(&self, bucket: &str, key: &str, data: &[u8]) {
        let path = self.buckets.join(bucket).join(key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create bucket dir");
        }
        std::fs::write(path, data).expect("Failed to write source object");
    }
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out);
        } else if let Ok(relative) = path.strip_prefix(root) {
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
}
