use crate::keys::validate_key;
use crate::traits::{BucketReader, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Resolve `storage_key` under `base_path`, rejecting traversal.
fn key_to_path(base_path: &Path, storage_key: &str) -> StorageResult<PathBuf> {
    validate_key(storage_key)?;
    Ok(base_path.join(storage_key))
}

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at `base_path`, creating the directory if needed.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    fn generate_url(&self, path: &Path) -> String {
        format!("file://{}", path.display())
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = key_to_path(&self.base_path, storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload_with_key successful"
        );

        Ok(self.generate_url(&path))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = key_to_path(&self.base_path, storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            "Local storage delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Source buckets laid out as directories: `{root}/{bucket}/{key}`.
#[derive(Clone)]
pub struct LocalBucketReader {
    root: PathBuf,
}

impl LocalBucketReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BucketReader for LocalBucketReader {
    async fn read(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(bucket)?;
        if bucket.contains('/') {
            return Err(StorageError::InvalidKey(format!(
                "Bucket name contains '/': {}",
                bucket
            )));
        }
        let path = key_to_path(&self.root.join(bucket), key)?;

        match fs::read(&path).await {
            Ok(data) => {
                tracing::debug!(
                    bucket = %bucket,
                    key = %key,
                    size_bytes = data.len(),
                    "Local bucket read"
                );
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{}/{}", bucket, key)))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_storage_upload_writes_file() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let data = b"test data".to_vec();
        let url = storage
            .upload_with_key("data_resized/cat/a_cat.jpeg", data.clone(), "image/jpeg")
            .await
            .unwrap();

        assert!(url.ends_with("data_resized/cat/a_cat.jpeg"));
        assert!(dir.path().join("data_resized/cat/a_cat.jpeg").is_file());

        let written = std::fs::read(dir.path().join("data_resized/cat/a_cat.jpeg")).unwrap();
        assert_eq!(data, written);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage
            .upload_with_key("../../../etc/passwd", b"x".to_vec(), "image/jpeg")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert!(storage.delete("nonexistent/file.txt").await.is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_delete_removes_file() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .upload_with_key("gone.jpeg", b"test".to_vec(), "image/jpeg")
            .await
            .unwrap();
        assert!(dir.path().join("gone.jpeg").is_file());

        storage.delete("gone.jpeg").await.unwrap();
        assert!(!dir.path().join("gone.jpeg").exists());
    }

    #[tokio::test]
    async fn test_bucket_reader_reads_bucket_directory() {
        let dir = tempdir().unwrap();
        let object = dir.path().join("public-images/cats/001.jpg");
        std::fs::create_dir_all(object.parent().unwrap()).unwrap();
        std::fs::write(&object, b"jpeg bytes").unwrap();

        let reader = LocalBucketReader::new(dir.path());
        let data = reader.read("public-images", "cats/001.jpg").await.unwrap();
        assert_eq!(data, b"jpeg bytes");

        let missing = reader.read("public-images", "cats/002.jpg").await;
        assert!(matches!(missing, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bucket_reader_rejects_traversal() {
        let dir = tempdir().unwrap();
        let reader = LocalBucketReader::new(dir.path());

        assert!(matches!(
            reader.read("..", "secret.jpg").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            reader.read("bucket", "../secret.jpg").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
