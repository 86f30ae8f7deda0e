//! Record-store abstraction.
//!
//! The pipeline never talks to a database directly; it goes through
//! [`AssetRecords`] so any persistence layer can sit behind it. The in-memory
//! implementation backs tests and single-process deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{AssetRecord, GeoPoint, StoredBlob};

/// Record store errors
#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("Asset record not found: {0}")]
    NotFound(Uuid),

    #[error("Asset record already exists: {0}")]
    AlreadyExists(Uuid),

    #[error("Record backend error: {0}")]
    BackendError(String),
}

/// Result type for record-store operations
pub type RecordsResult<T> = Result<T, RecordsError>;

/// Persistence operations the pipeline needs from the owning application.
#[async_trait]
pub trait AssetRecords: Send + Sync {
    /// Fetch a record by id.
    async fn get(&self, id: Uuid) -> RecordsResult<AssetRecord>;

    /// Insert a freshly ingested record.
    async fn insert(&self, record: AssetRecord) -> RecordsResult<()>;

    /// Replace the record's blob reference and return the previous blob so
    /// the caller can purge it. The record itself is otherwise untouched.
    async fn repoint_blob(&self, id: Uuid, blob: StoredBlob) -> RecordsResult<StoredBlob>;

    /// Write extracted capture metadata directly to the record.
    ///
    /// This is a raw column write: it must not trigger validation or any
    /// change hooks, since the record is mid-processing and re-entrancy
    /// would reprocess the blob.
    async fn update_capture_metadata(
        &self,
        id: Uuid,
        coordinates: Option<GeoPoint>,
        captured_at: Option<NaiveDateTime>,
    ) -> RecordsResult<()>;
}

/// In-memory record store.
#[derive(Clone, Default)]
pub struct InMemoryRecords {
    records: Arc<RwLock<HashMap<Uuid, AssetRecord>>>,
}

impl InMemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AssetRecords for InMemoryRecords {
    async fn get(&self, id: Uuid) -> RecordsResult<AssetRecord> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RecordsError::NotFound(id))
    }

    async fn insert(&self, record: AssetRecord) -> RecordsResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(RecordsError::AlreadyExists(record.id));
        }
        records.insert(record.id, record);
        Ok(())
    }

    async fn repoint_blob(&self, id: Uuid, blob: StoredBlob) -> RecordsResult<StoredBlob> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(RecordsError::NotFound(id))?;
        let old = std::mem::replace(&mut record.blob, blob);
        record.filename = record.blob.filename.clone();
        Ok(old)
    }

    async fn update_capture_metadata(
        &self,
        id: Uuid,
        coordinates: Option<GeoPoint>,
        captured_at: Option<NaiveDateTime>,
    ) -> RecordsResult<()> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(RecordsError::NotFound(id))?;
        record.coordinates = coordinates;
        record.captured_at = captured_at;
        Ok(())
    }
}
