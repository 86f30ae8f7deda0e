//! Photoflow Storage Library
//!
//! This crate provides the blob-store abstraction and its backends. Blobs
//! carry their metadata (dimensions and processing flags) with the object so
//! the pipeline's idempotency check works against storage alone.
//!
//! # Blob key format
//!
//! Keys are `assets/{uuid}.{ext}`. Keys must not contain `..` or a leading
//! `/`. Key generation is centralized in the `keys` module so all backends
//! stay consistent.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_blob_store;
#[cfg(feature = "storage-local")]
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use photoflow_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3BlobStore;
pub use traits::{BlobStore, StorageError, StorageResult};
