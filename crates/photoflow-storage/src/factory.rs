#[cfg(feature = "storage-local")]
use crate::LocalBlobStore;
use crate::MemoryBlobStore;
#[cfg(feature = "storage-s3")]
use crate::S3BlobStore;
use crate::{BlobStore, StorageBackend, StorageError, StorageResult};
use photoflow_core::PipelineConfig;
use std::sync::Arc;

/// Create a blob store backend based on configuration
pub async fn create_blob_store(config: &PipelineConfig) -> StorageResult<Arc<dyn BlobStore>> {
    let backend = config.storage_backend.unwrap_or(StorageBackend::S3);

    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint.clone();

            let store = S3BlobStore::new(bucket, region, endpoint).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let store = LocalBlobStore::new(base_path).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => Ok(Arc::new(MemoryBlobStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_needs_no_configuration() {
        let config = PipelineConfig {
            storage_backend: Some(StorageBackend::Memory),
            ..Default::default()
        };
        let store = create_blob_store(&config).await.unwrap();
        assert_eq!(store.backend_type(), StorageBackend::Memory);
    }

    #[cfg(feature = "storage-local")]
    #[tokio::test]
    async fn local_backend_requires_path() {
        let config = PipelineConfig {
            storage_backend: Some(StorageBackend::Local),
            local_storage_path: None,
            ..Default::default()
        };
        assert!(matches!(
            create_blob_store(&config).await,
            Err(StorageError::ConfigError(_))
        ));
    }
}
