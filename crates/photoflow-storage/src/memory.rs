//! In-memory blob store for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use photoflow_core::models::{BlobMetadata, StoredBlob};
use photoflow_core::StorageBackend;
use tokio::sync::RwLock;

use crate::keys;
use crate::traits::{BlobStore, StorageError, StorageResult};

#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, (StoredBlob, Vec<u8>)>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs. Handy for leak assertions in tests.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn create(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
        metadata: BlobMetadata,
    ) -> StorageResult<StoredBlob> {
        let key = keys::generate_key(filename);
        let blob = StoredBlob {
            key: key.clone(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            byte_size: data.len() as u64,
            checksum: keys::checksum_hex(&data),
            metadata,
        };

        self.objects
            .write()
            .await
            .insert(key.clone(), (blob.clone(), data));

        tracing::debug!(key = %key, size_bytes = blob.byte_size, "Memory store create");
        Ok(blob)
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn head(&self, key: &str) -> StorageResult<StoredBlob> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|(blob, _)| blob.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn purge(&self, key: &str) -> StorageResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
