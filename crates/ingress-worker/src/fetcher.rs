//! Byte retrieval for a resolved source
//!
//! Each source variant lands as a single raw file in the request's scratch dir.
//! Every failure here is soft: the request is dropped and the batch continues.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ingress_core::models::{ResolvedSource, SourceLocation};
use ingress_core::{IngestError, IngestResult};
use ingress_storage::BucketReader;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    bucket_reader: Arc<dyn BucketReader>,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(
        client: reqwest::Client,
        bucket_reader: Arc<dyn BucketReader>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            bucket_reader,
            timeout,
        }
    }

    /// Write the raw image bytes of `source` to `dest`.
    pub async fn fetch(&self, source: &ResolvedSource, dest: &Path) -> IngestResult<PathBuf> {
        let bytes = match &source.location {
            SourceLocation::Remote { url } => self.download(url).await?,
            SourceLocation::Bucket { bucket, key } => self.read_bucket(bucket, key).await?,
            SourceLocation::Inline { payload } => decode_inline(payload)?,
        };

        tokio::fs::write(dest, &bytes).await.map_err(|e| {
            IngestError::soft(format!(
                "Failed to write raw image to {}: {}",
                dest.display(),
                e
            ))
        })?;

        tracing::debug!(
            location = %source.effective_location(),
            path = %dest.display(),
            size = bytes.len(),
            "Raw image fetched"
        );

        Ok(dest.to_path_buf())
    }

    async fn download(&self, url: &str) -> IngestResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::soft(format!("Error downloading {}: {}", url, e)))?;

        if response.status() != StatusCode::OK {
            return Err(IngestError::soft(format!(
                "Error downloading {}: status {}",
                url,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IngestError::soft(format!("Error reading body of {}: {}", url, e)))?;
        Ok(body.to_vec())
    }

    async fn read_bucket(&self, bucket: &str, key: &str) -> IngestResult<Vec<u8>> {
        match tokio::time::timeout(self.timeout, self.bucket_reader.read(bucket, key)).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(IngestError::soft(format!(
                "Error reading {}/{}: {}",
                bucket, key, e
            ))),
            Err(_) => Err(IngestError::soft(format!(
                "Timed out reading {}/{} after {:?}",
                bucket, key, self.timeout
            ))),
        }
    }
}

/// Decode a base64 payload and check that it holds a recognizable image.
fn decode_inline(payload: &str) -> IngestResult<Vec<u8>> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| IngestError::soft(format!("Inline payload is not valid base64: {}", e)))?;

    image::guess_format(&bytes)
        .map_err(|e| IngestError::soft(format!("Inline payload is not an image: {}", e)))?;

    Ok(bytes)
}
