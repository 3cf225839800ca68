//! Shared handles for the pipeline
//!
//! Built once at process start and passed into the orchestrator. Every handle is
//! safe to share between concurrently running workers; all mutable state lives in
//! the external stores.

use anyhow::{Context, Result};
use ingress_core::{Config, PipelineSettings};
use ingress_db::{create_record_store, RecordStore};
use ingress_storage::{create_bucket_reader, create_storage, BucketReader, Storage};
use reqwest::redirect::Policy;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct WorkerContext {
    pub storage: Arc<dyn Storage>,
    pub bucket_reader: Arc<dyn BucketReader>,
    pub records: Arc<dyn RecordStore>,
    pub http: reqwest::Client,
    pub settings: PipelineSettings,
}

/// HTTP client for link checks and downloads. Redirects are never followed
/// automatically; the resolver counts 301 hops itself.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::none())
        .user_agent(concat!("ingress-worker/", env!("CARGO_PKG_VERSION")))
        .build()
}

impl WorkerContext {
    pub fn new(
        storage: Arc<dyn Storage>,
        bucket_reader: Arc<dyn BucketReader>,
        records: Arc<dyn RecordStore>,
        settings: PipelineSettings,
    ) -> Result<Self> {
        let http =
            build_http_client(settings.http_timeout).context("Failed to create HTTP client")?;

        Ok(Self {
            storage,
            bucket_reader,
            records,
            http,
            settings,
        })
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage = create_storage(config)
            .await
            .context("Failed to initialize derivative storage")?;
        let bucket_reader =
            create_bucket_reader(config).context("Failed to initialize source bucket reader")?;
        let records = create_record_store(config)
            .await
            .context("Failed to initialize record store")?;

        tracing::info!(
            storage_backend = %storage.backend_type(),
            record_store = records.backend_name(),
            "Worker context initialized"
        );

        Self::new(storage, bucket_reader, records, config.pipeline_settings())
    }
}
