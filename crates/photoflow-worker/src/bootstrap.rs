//! Wiring: configuration to a ready pipeline.

use std::sync::Arc;

use photoflow_core::{AssetRecords, PipelineConfig};
use photoflow_processing::ImagePipeline;
use photoflow_storage::create_blob_store;

/// Build a pipeline from configuration and a record store. The blob store
/// backend comes from the config (S3, local, or memory).
pub async fn build_pipeline(
    config: &PipelineConfig,
    records: Arc<dyn AssetRecords>,
) -> anyhow::Result<Arc<ImagePipeline>> {
    config.validate()?;
    let store = create_blob_store(config).await?;
    tracing::info!(backend = %store.backend_type(), "Blob store ready");
    Ok(Arc::new(ImagePipeline::new(config, store, records)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoflow_core::InMemoryRecords;

    #[tokio::test]
    async fn default_config_builds_a_memory_backed_pipeline() {
        let config = PipelineConfig::default();
        let records = Arc::new(InMemoryRecords::new());
        assert!(build_pipeline(&config, records).await.is_ok());
    }
}
