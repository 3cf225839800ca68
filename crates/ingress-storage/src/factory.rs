#[cfg(feature = "storage-local")]
use crate::{LocalBucketReader, LocalStorage};
#[cfg(feature = "storage-s3")]
use crate::{S3BucketReader, S3Storage};
use crate::{BucketReader, Storage, StorageBackend, StorageError, StorageResult};
use ingress_core::Config;
use std::sync::Arc;

/// Create the derivative store based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config.s3_bucket().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_BUCKET_NAME not configured".to_string())
            })?;
            let region = config.s3_region().to_string();
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(bucket, region, endpoint).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = local_path(config)?;
            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Create the source bucket reader. The local backend treats each bucket as a
/// directory under `LOCAL_STORAGE_PATH`.
pub fn create_bucket_reader(config: &Config) -> StorageResult<Arc<dyn BucketReader>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => Ok(Arc::new(S3BucketReader::new(
            config.s3_region().to_string(),
            config.s3_endpoint().map(String::from),
        ))),

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => Ok(Arc::new(LocalBucketReader::new(local_path(config)?))),

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(feature = "storage-local")]
fn local_path(config: &Config) -> StorageResult<String> {
    config
        .local_storage_path()
        .map(String::from)
        .ok_or_else(|| StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string()))
}
