use crate::keys::validate_key;
use crate::traits::{BucketReader, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Source bucket clients kept alive at once by [`S3BucketReader`].
pub const DEFAULT_BUCKET_CLIENT_CAPACITY: usize = 32;

fn apply_endpoint(builder: AmazonS3Builder, endpoint_url: Option<&str>) -> AmazonS3Builder {
    match endpoint_url {
        Some(endpoint) => {
            let allow_http = endpoint.starts_with("http://");
            builder
                .with_endpoint(endpoint.to_string())
                .with_allow_http(allow_http)
        }
        None => builder,
    }
}

async fn get_bytes(store: &AmazonS3, bucket: &str, key: &str) -> StorageResult<Bytes> {
    let start = std::time::Instant::now();
    let location = Path::from(key.to_string());

    let result: ObjectResult<_> = store.get(&location).await;

    let result = result.map_err(|e| match e {
        ObjectStoreError::NotFound { .. } => StorageError::NotFound(format!("{}/{}", bucket, key)),
        other => {
            tracing::error!(
                error = %other,
                bucket = %bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 download failed"
            );
            StorageError::DownloadFailed(other.to_string())
        }
    })?;

    let bytes = result
        .bytes()
        .await
        .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

    tracing::info!(
        bucket = %bucket,
        key = %key,
        size_bytes = bytes.len() as u64,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "S3 download successful"
    );

    Ok(bytes)
}

/// S3 storage for derivatives, bound to the worker's own bucket.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        let store = apply_endpoint(builder, endpoint_url.as_deref())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    /// Public URL for an object. Path-style when a custom endpoint is configured.
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;

        let size = data.len() as u64;
        let bytes = Bytes::from(data);
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(bytes)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload_with_key failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let url = self.generate_url(storage_key);

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload_with_key successful"
        );

        Ok(url)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_key(storage_key)?;
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Unsigned reads from public buckets named by incoming requests.
///
/// One client is built per bucket on first use. At most `capacity` clients are
/// kept; the least recently used one is dropped when a new bucket is seen.
pub struct S3BucketReader {
    region: String,
    endpoint_url: Option<String>,
    stores: Mutex<LruCache<String, AmazonS3>>,
}

impl S3BucketReader {
    pub fn new(region: String, endpoint_url: Option<String>) -> Self {
        Self::with_capacity(region, endpoint_url, DEFAULT_BUCKET_CLIENT_CAPACITY)
    }

    pub fn with_capacity(region: String, endpoint_url: Option<String>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            region,
            endpoint_url,
            stores: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StorageError::BackendError("bucket client cache poisoned".to_string()))?;

        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let builder = AmazonS3Builder::new()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string())
            .with_skip_signature(true);

        let store = apply_endpoint(builder, self.endpoint_url.as_deref())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        if let Some((evicted, _)) = stores.push(bucket.to_string(), store.clone()) {
            tracing::debug!(bucket = %evicted, "Evicted source bucket client");
        }
        Ok(store)
    }
}

#[async_trait]
impl BucketReader for S3BucketReader {
    async fn read(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        if bucket.is_empty() {
            return Err(StorageError::InvalidKey("Bucket name is empty".to_string()));
        }
        validate_key(key)?;

        let store = self.store_for(bucket)?;
        let bytes = get_bytes(&store, bucket, key).await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_url_aws() {
        let storage = S3Storage::new("derivatives".to_string(), "eu-west-1".to_string(), None)
            .await
            .unwrap();
        assert_eq!(
            storage.generate_url("data_resized/cat/x_cat.jpeg"),
            "https://derivatives.s3.eu-west-1.amazonaws.com/data_resized/cat/x_cat.jpeg"
        );
    }

    #[tokio::test]
    async fn test_generate_url_custom_endpoint() {
        let storage = S3Storage::new(
            "derivatives".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000/".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(
            storage.generate_url("data_resized/cat/x_cat.jpeg"),
            "http://localhost:9000/derivatives/data_resized/cat/x_cat.jpeg"
        );
    }

    #[test]
    fn test_bucket_reader_caches_clients() {
        let reader = S3BucketReader::new("us-east-1".to_string(), None);
        reader.store_for("public-a").unwrap();
        reader.store_for("public-a").unwrap();
        reader.store_for("public-b").unwrap();
        assert_eq!(reader.stores.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_bucket_reader_cache_is_bounded() {
        let reader = S3BucketReader::with_capacity("us-east-1".to_string(), None, 3);
        for i in 0..8 {
            reader.store_for(&format!("bucket-{}", i)).unwrap();
        }

        let stores = reader.stores.lock().unwrap();
        assert_eq!(stores.len(), 3);
        assert!(stores.contains("bucket-7"));
        assert!(!stores.contains("bucket-0"));
    }

    #[test]
    fn test_recently_used_bucket_survives_eviction() {
        let reader = S3BucketReader::with_capacity("us-east-1".to_string(), None, 2);
        reader.store_for("hot").unwrap();
        reader.store_for("cold").unwrap();
        reader.store_for("hot").unwrap();
        reader.store_for("new").unwrap();

        let stores = reader.stores.lock().unwrap();
        assert!(stores.contains("hot"));
        assert!(!stores.contains("cold"));
    }

    #[tokio::test]
    async fn test_bucket_reader_rejects_bad_keys() {
        let reader = S3BucketReader::new("us-east-1".to_string(), None);
        assert!(matches!(
            reader.read("", "a.jpg").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            reader.read("bucket", "../a.jpg").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
