use crate::keys;
use crate::traits::{BlobStore, StorageError, StorageResult};
use async_trait::async_trait;
use photoflow_core::models::{BlobMetadata, StoredBlob};
use photoflow_core::StorageBackend;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem blob store
///
/// Each blob is a data file at its key path plus a `{key}.meta.json` sidecar
/// holding the full [`StoredBlob`] description. The sidecar is what makes the
/// processed-flag check possible without a database.
#[derive(Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    /// Create a new LocalBlobStore rooted at `base_path`.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalBlobStore { base_path })
    }

    /// Convert blob key to filesystem path with security validation
    ///
    /// Rejects keys with path traversal sequences that could escape the base
    /// storage directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Blob key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(key))
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".meta.json");
        PathBuf::from(name)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn create(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
        metadata: BlobMetadata,
    ) -> StorageResult<StoredBlob> {
        let key = keys::generate_key(filename);
        let path = self.key_to_path(&key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let blob = StoredBlob {
            key: key.clone(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            byte_size: size as u64,
            checksum: keys::checksum_hex(&data),
            metadata,
        };

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;
        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let sidecar = Self::sidecar_path(&path);
        let json = serde_json::to_vec_pretty(&blob)
            .map_err(|e| StorageError::UploadFailed(format!("Failed to encode metadata: {}", e)))?;
        fs::write(&sidecar, json).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write sidecar {}: {}",
                sidecar.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local blob create successful"
        );

        Ok(blob)
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local blob read successful"
        );

        Ok(data)
    }

    async fn head(&self, key: &str) -> StorageResult<StoredBlob> {
        let path = self.key_to_path(key)?;
        let sidecar = Self::sidecar_path(&path);

        if !fs::try_exists(&sidecar).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let json = fs::read(&sidecar).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to read sidecar {}: {}",
                sidecar.display(),
                e
            ))
        })?;

        serde_json::from_slice(&json).map_err(|e| {
            StorageError::BackendError(format!(
                "Corrupt sidecar {}: {}",
                sidecar.display(),
                e
            ))
        })
    }

    async fn purge(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let sidecar = Self::sidecar_path(&path);
        let start = std::time::Instant::now();

        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_file(&path).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        if fs::try_exists(&sidecar).await.unwrap_or(false) {
            fs::remove_file(&sidecar).await.map_err(|e| {
                StorageError::DeleteFailed(format!(
                    "Failed to delete sidecar {}: {}",
                    sidecar.display(),
                    e
                ))
            })?;
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local blob purge successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
