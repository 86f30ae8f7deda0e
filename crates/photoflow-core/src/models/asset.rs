//! Asset domain models.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::blob::StoredBlob;

/// Raw upload as received from the transport layer. Lives for a single
/// ingest attempt and is never persisted as-is.
#[derive(Clone, Debug)]
pub struct UploadedAsset {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedAsset {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

/// A capture location in decimal degrees, rounded to six places.
/// Southern latitudes and western longitudes are negative.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Metadata recovered from the original upload. Every field is optional:
/// extraction failures degrade to `None`, never to a processing error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub coordinates: Option<GeoPoint>,
    pub captured_at: Option<NaiveDateTime>,
}

impl ExtractedMetadata {
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_none() && self.captured_at.is_none()
    }
}

/// The persisted record owning exactly one live blob. The blob reference is
/// replaced atomically by the pipeline; the blob itself is never edited.
#[derive(Clone, Debug)]
pub struct AssetRecord {
    pub id: Uuid,
    pub filename: String,
    pub blob: StoredBlob,
    pub coordinates: Option<GeoPoint>,
    pub captured_at: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
}

impl AssetRecord {
    pub fn new(filename: impl Into<String>, blob: StoredBlob) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            blob,
            coordinates: None,
            captured_at: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::blob::BlobMetadata;

    #[test]
    fn extracted_metadata_default_is_empty() {
        assert!(ExtractedMetadata::default().is_empty());
    }

    #[test]
    fn new_record_starts_without_capture_metadata() {
        let blob = StoredBlob {
            key: "assets/test".to_string(),
            filename: "test.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            byte_size: 3,
            checksum: "abc".to_string(),
            metadata: BlobMetadata::default(),
        };
        let record = AssetRecord::new("test.jpg", blob);
        assert!(record.coordinates.is_none());
        assert!(record.captured_at.is_none());
        assert!(!record.blob.metadata.processed);
    }
}
