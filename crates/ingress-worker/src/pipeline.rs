//! Ingestion orchestrator
//!
//! Runs one request through every stage and turns the first stage error into a
//! terminal [`IngestionOutcome`]. Scratch files are removed on every exit path.

use ingress_core::constants::DERIVATIVE_JPEG_QUALITY;
use ingress_core::models::{
    DataSource, FingerprintSet, ImageRecord, IngestionOutcome, IngestionRequest,
};
use ingress_core::{IngestError, IngestResult, LogLevel};
use ingress_db::InsertOutcome;
use ingress_processing::{DerivativeRenderer, FingerprintEngine, Normalizer, ProcessingError};
use ingress_storage::derivative_key;
use std::time::Instant;
use uuid::Uuid;

use crate::context::WorkerContext;
use crate::fetcher::Fetcher;
use crate::resolver::SourceResolver;
use crate::scratch::Scratch;

const DERIVATIVE_CONTENT_TYPE: &str = "image/jpeg";

pub struct Orchestrator {
    ctx: WorkerContext,
    resolver: SourceResolver,
    fetcher: Fetcher,
    normalizer: Normalizer,
    fingerprints: FingerprintEngine,
    renderer: DerivativeRenderer,
}

/// Run CPU-bound image work off the async runtime.
async fn run_blocking<T, F>(stage: &str, f: F) -> IngestResult<T>
where
    F: FnOnce() -> Result<T, ProcessingError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| IngestError::Processing(format!("{} task failed: {}", stage, e)))?
        .map_err(IngestError::from)
}

fn report(err: &IngestError) {
    match err.log_level() {
        LogLevel::Error => tracing::error!(error = %err, "Request dropped"),
        LogLevel::Warn => tracing::warn!(error = %err, "Request dropped"),
    }
}

/// Request link as it may appear in logs. Inline payloads are summarized.
fn loggable_link(request: &IngestionRequest) -> String {
    match request.data_source {
        DataSource::BodyImage => format!("inline ({} bytes)", request.url.len()),
        _ => request.url.clone(),
    }
}

impl Orchestrator {
    pub fn new(ctx: WorkerContext) -> Self {
        let settings = &ctx.settings;
        let resolver = SourceResolver::new(ctx.http.clone(), settings.max_redirects);
        let fetcher = Fetcher::new(
            ctx.http.clone(),
            ctx.bucket_reader.clone(),
            settings.http_timeout,
        );
        let normalizer = Normalizer::new(settings.jpeg_quality);
        let fingerprints = FingerprintEngine::from_settings(settings);
        let renderer = DerivativeRenderer::new(settings.derivative_size, DERIVATIVE_JPEG_QUALITY);

        Self {
            ctx,
            resolver,
            fetcher,
            normalizer,
            fingerprints,
            renderer,
        }
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    /// Parse a raw queue message body and process it.
    pub async fn process_body(&self, body: &str) -> IngestionOutcome {
        match IngestionRequest::from_body(body) {
            Ok(request) => self.process(&request).await,
            Err(err) => {
                report(&err);
                IngestionOutcome::from_error(&err)
            }
        }
    }

    #[tracing::instrument(
        skip(self, request),
        fields(
            classification = %request.classification,
            data_source = %request.data_source,
            link = %loggable_link(request)
        )
    )]
    pub async fn process(&self, request: &IngestionRequest) -> IngestionOutcome {
        if let Err(err) = request.validate() {
            report(&err);
            return IngestionOutcome::from_error(&err);
        }

        let started = Instant::now();
        let filename = format!("{}_{}", Uuid::new_v4().simple(), request.classification);

        let mut scratch = match Scratch::create(&self.ctx.settings.scratch_dir) {
            Ok(scratch) => scratch,
            Err(err) => {
                report(&err);
                return IngestionOutcome::from_error(&err);
            }
        };

        let outcome = match self.run(request, &filename, &mut scratch).await {
            Ok(outcome) => outcome,
            Err(err) => {
                report(&err);
                IngestionOutcome::from_error(&err)
            }
        };

        let cleanup_failures = scratch.cleanup();

        tracing::info!(
            outcome = outcome.label(),
            cleanup_failures,
            duration_ms = started.elapsed().as_millis() as u64,
            "Request finished"
        );

        outcome
    }

    async fn run(
        &self,
        request: &IngestionRequest,
        filename: &str,
        scratch: &mut Scratch,
    ) -> IngestResult<IngestionOutcome> {
        let source = self.resolver.resolve(request).await?;

        let raw_path =
            scratch.artifact(&format!("{}{}", filename, source.file_extension.as_str()));
        self.fetcher.fetch(&source, &raw_path).await?;

        let normalizer = self.normalizer;
        let normalized_path =
            run_blocking("normalize", move || normalizer.normalize(&raw_path)).await?;
        scratch.track(normalized_path.clone());

        let engine = self.fingerprints.clone();
        let fingerprint_input = normalized_path.clone();
        let hashes =
            run_blocking("fingerprint", move || engine.fingerprint(&fingerprint_input)).await?;
        let id = hashes.crop_resistant_hash.clone();

        let exists = self.ctx.records.exists(&id).await.map_err(|e| {
            IngestError::soft(format!("Existence check for {} failed: {}", id, e))
        })?;
        if exists {
            tracing::warn!(crop_hash = %id, "Image already exists");
            return Ok(IngestionOutcome::SkippedDuplicate { id });
        }

        let renderer = self.renderer;
        let derivative =
            run_blocking("derivative", move || renderer.render(&normalized_path)).await?;

        let key = derivative_key(&request.classification, filename);
        self.ctx
            .storage
            .upload_with_key(&key, derivative, DERIVATIVE_CONTENT_TYPE)
            .await
            .map_err(|e| IngestError::soft(format!("Derivative upload to {} failed: {}", key, e)))?;
        tracing::info!(crop_hash = %id, derivative_key = %key, "Derivative uploaded");

        self.persist(request, hashes, filename, key).await
    }

    /// Conditional record insert after the derivative is in place.
    async fn persist(
        &self,
        request: &IngestionRequest,
        hashes: FingerprintSet,
        filename: &str,
        derivative_key: String,
    ) -> IngestResult<IngestionOutcome> {
        let record = ImageRecord::new(request, hashes, format!("{}.jpeg", filename));
        let id = record.id.clone();

        match self.ctx.records.insert_if_absent(&record).await {
            Ok(InsertOutcome::Inserted) => {
                tracing::info!(crop_hash = %id, "Image record written");
                Ok(IngestionOutcome::Persisted { id, derivative_key })
            }
            Ok(InsertOutcome::AlreadyExists) => {
                // Another worker wrote the same fingerprint between the check and
                // the insert. Its derivative is the one its record points at.
                tracing::warn!(crop_hash = %id, "Image already exists");
                if let Err(e) = self.ctx.storage.delete(&derivative_key).await {
                    tracing::error!(
                        derivative_key = %derivative_key,
                        error = %e,
                        "Failed to remove derivative of duplicate image"
                    );
                }
                Ok(IngestionOutcome::SkippedDuplicate { id })
            }
            Err(e) => {
                let err = IngestError::PersistenceFailure(e.to_string());
                tracing::warn!(
                    crop_hash = %id,
                    derivative_key = %derivative_key,
                    error = %err,
                    "Record write failed, derivative kept"
                );
                Ok(IngestionOutcome::PersistedWithoutRecord {
                    id,
                    derivative_key,
                    reason: err.to_string(),
                })
            }
        }
    }
}
