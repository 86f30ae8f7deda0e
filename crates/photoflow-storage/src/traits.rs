//! Blob store abstraction trait
//!
//! This module defines the BlobStore trait that all storage backends must
//! implement.

use async_trait::async_trait;
use photoflow_core::models::{BlobMetadata, StoredBlob};
use photoflow_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Blob store abstraction trait
///
/// All backends (S3, local filesystem, in-memory) must implement this trait.
/// The pipeline works against it without coupling to backend details.
///
/// **Key format:** `assets/{uuid}.{ext}`. See the crate root documentation.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a new blob under a freshly generated key and return its
    /// description. The checksum is computed by the backend.
    async fn create(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
        metadata: BlobMetadata,
    ) -> StorageResult<StoredBlob>;

    /// Read a blob's content by key.
    async fn read(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Fetch a blob's description without its content.
    async fn head(&self, key: &str) -> StorageResult<StoredBlob>;

    /// Delete a blob and its metadata. Deleting a missing blob is not an
    /// error.
    async fn purge(&self, key: &str) -> StorageResult<()>;

    /// Check if a blob exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
