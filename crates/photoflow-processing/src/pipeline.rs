//! Pipeline orchestrator.
//!
//! Ties the stages together: ingest validation, the idempotency check,
//! EXIF extraction, format planning, the compression ladder, and the
//! upload-new / repoint / purge-old blob swap.

use std::sync::Arc;
use std::time::Instant;

use photoflow_core::models::{AssetRecord, BlobMetadata, ExtractedMetadata, UploadedAsset};
use photoflow_core::{AssetRecords, PipelineConfig};
use photoflow_storage::BlobStore;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::exif::ExifExtractor;
use crate::ladder::{CompressionLadder, Tier};
use crate::planner::FormatPlanner;
use crate::validator::IngestValidator;

/// What a processing run did.
#[derive(Debug)]
pub enum ProcessingOutcome {
    /// The live blob already carries the processed flag; nothing was touched.
    AlreadyProcessed,
    Processed(ProcessingReport),
}

/// Summary of a completed run.
#[derive(Clone, Debug)]
pub struct ProcessingReport {
    pub tier: Tier,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
    pub content_type: String,
    pub metadata: ExtractedMetadata,
}

pub struct ImagePipeline {
    store: Arc<dyn BlobStore>,
    records: Arc<dyn AssetRecords>,
    validator: IngestValidator,
    ladder: CompressionLadder,
}

impl ImagePipeline {
    pub fn new(
        config: &PipelineConfig,
        store: Arc<dyn BlobStore>,
        records: Arc<dyn AssetRecords>,
    ) -> Self {
        Self {
            store,
            records,
            validator: IngestValidator::new(config.max_upload_bytes),
            ladder: CompressionLadder::new(config),
        }
    }

    /// Accept an upload: validate, store the original blob untouched, and
    /// insert the record. Validation runs first, so a rejected upload leaves
    /// nothing behind in storage or the record store.
    pub async fn ingest_upload(&self, upload: UploadedAsset) -> Result<AssetRecord, PipelineError> {
        self.validator.validate(&upload)?;

        let blob = self
            .store
            .create(
                &upload.filename,
                &upload.content_type,
                upload.bytes,
                BlobMetadata::default(),
            )
            .await?;

        let record = AssetRecord::new(upload.filename, blob);
        tracing::info!(
            asset_id = %record.id,
            key = %record.blob.key,
            content_type = %record.blob.content_type,
            size_bytes = record.blob.byte_size,
            "Upload ingested"
        );

        self.records.insert(record.clone()).await?;
        Ok(record)
    }

    /// Process an ingested asset: extract capture metadata, re-encode within
    /// the dimension and size budgets, then swap the processed blob in for
    /// the original. Safe to call again on a processed asset; the flag on
    /// the live blob short-circuits the run.
    pub async fn process_asset(&self, asset_id: Uuid) -> Result<ProcessingOutcome, PipelineError> {
        let start = Instant::now();
        let record = self.records.get(asset_id).await?;

        if record.blob.metadata.processed {
            tracing::debug!(asset_id = %asset_id, key = %record.blob.key, "Blob already processed, skipping");
            return Ok(ProcessingOutcome::AlreadyProcessed);
        }

        let original = self.store.read(&record.blob.key).await?;

        // Metadata comes off the original bytes; re-encoding strips EXIF.
        let metadata = ExifExtractor::extract(&original);

        let plan = FormatPlanner::plan(&record.filename, &record.blob.content_type);
        let encoded = self.ladder.run(original, &plan).await?;

        let new_blob = self
            .store
            .create(
                &encoded.filename,
                &encoded.content_type,
                encoded.bytes,
                BlobMetadata::processed(encoded.width, encoded.height),
            )
            .await?;

        let old_blob = match self.records.repoint_blob(asset_id, new_blob.clone()).await {
            Ok(old) => old,
            Err(e) => {
                // The record still points at the original; remove the orphan
                // we just uploaded.
                if let Err(purge_err) = self.store.purge(&new_blob.key).await {
                    tracing::warn!(
                        error = %purge_err,
                        key = %new_blob.key,
                        "Failed to purge orphaned blob after repoint failure"
                    );
                }
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.purge(&old_blob.key).await {
            // The swap already happened; a stale original is not worth
            // failing the run over.
            tracing::warn!(error = %e, key = %old_blob.key, "Failed to purge replaced blob");
        }

        self.apply_capture_metadata(&record, &metadata).await?;

        tracing::info!(
            asset_id = %asset_id,
            tier = %encoded.tier,
            width = encoded.width,
            height = encoded.height,
            size_bytes = encoded.byte_size,
            content_type = %encoded.content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image processing complete"
        );

        Ok(ProcessingOutcome::Processed(ProcessingReport {
            tier: encoded.tier,
            width: encoded.width,
            height: encoded.height,
            byte_size: encoded.byte_size,
            content_type: encoded.content_type,
            metadata,
        }))
    }

    /// Write extracted coordinates and timestamp to the record. Fields the
    /// scan did not produce keep their stored values, and nothing is written
    /// when the merge changes nothing.
    async fn apply_capture_metadata(
        &self,
        record: &AssetRecord,
        metadata: &ExtractedMetadata,
    ) -> Result<(), PipelineError> {
        if metadata.is_empty() {
            return Ok(());
        }

        let coordinates = metadata.coordinates.or(record.coordinates);
        let captured_at = metadata.captured_at.or(record.captured_at);
        if coordinates == record.coordinates && captured_at == record.captured_at {
            return Ok(());
        }

        self.records
            .update_capture_metadata(record.id, coordinates, captured_at)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use photoflow_core::models::{GeoPoint, StoredBlob};
    use photoflow_core::InMemoryRecords;
    use photoflow_storage::MemoryBlobStore;

    fn test_pipeline(records: Arc<InMemoryRecords>) -> ImagePipeline {
        ImagePipeline::new(
            &PipelineConfig::default(),
            Arc::new(MemoryBlobStore::new()),
            records,
        )
    }

    fn test_blob() -> StoredBlob {
        StoredBlob {
            key: "assets/a.jpg".to_string(),
            filename: "a.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            byte_size: 10,
            checksum: "deadbeef".to_string(),
            metadata: BlobMetadata::default(),
        }
    }

    fn test_timestamp() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 14)
            .unwrap()
            .and_hms_opt(16, 2, 55)
            .unwrap()
    }

    #[tokio::test]
    async fn timestamp_only_extraction_keeps_stored_coordinates() {
        let records = Arc::new(InMemoryRecords::new());
        let pipeline = test_pipeline(records.clone());

        let point = GeoPoint {
            latitude: 48.858844,
            longitude: 2.294351,
        };
        let mut record = AssetRecord::new("a.jpg", test_blob());
        record.coordinates = Some(point);
        let id = record.id;
        records.insert(record.clone()).await.unwrap();

        let metadata = ExtractedMetadata {
            coordinates: None,
            captured_at: Some(test_timestamp()),
        };
        pipeline
            .apply_capture_metadata(&record, &metadata)
            .await
            .unwrap();

        let fetched = records.get(id).await.unwrap();
        assert_eq!(fetched.coordinates, Some(point));
        assert_eq!(fetched.captured_at, Some(test_timestamp()));
    }

    #[tokio::test]
    async fn coordinates_only_extraction_keeps_stored_timestamp() {
        let records = Arc::new(InMemoryRecords::new());
        let pipeline = test_pipeline(records.clone());

        let mut record = AssetRecord::new("a.jpg", test_blob());
        record.captured_at = Some(test_timestamp());
        let id = record.id;
        records.insert(record.clone()).await.unwrap();

        let point = GeoPoint {
            latitude: -57.227772,
            longitude: 10.5,
        };
        let metadata = ExtractedMetadata {
            coordinates: Some(point),
            captured_at: None,
        };
        pipeline
            .apply_capture_metadata(&record, &metadata)
            .await
            .unwrap();

        let fetched = records.get(id).await.unwrap();
        assert_eq!(fetched.coordinates, Some(point));
        assert_eq!(fetched.captured_at, Some(test_timestamp()));
    }
}
