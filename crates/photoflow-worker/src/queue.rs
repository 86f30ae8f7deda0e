//! Bounded processing queue.
//!
//! A fixed pool of workers drains submitted asset ids through the pipeline.
//! Failures are logged with their error kind and swallowed here; the typed
//! result stays available to callers that invoke the pipeline directly and
//! want to propagate instead.

use std::sync::Arc;

use photoflow_processing::{ImagePipeline, ProcessingOutcome};
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

pub struct ProcessQueue {
    submit_tx: mpsc::Sender<Uuid>,
    shutdown_tx: mpsc::Sender<()>,
}

impl ProcessQueue {
    pub fn new(pipeline: Arc<ImagePipeline>, max_workers: usize, queue_depth: usize) -> Self {
        let (submit_tx, submit_rx) = mpsc::channel(queue_depth);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(worker_pool(pipeline, submit_rx, shutdown_rx, max_workers));
        tracing::info!(max_workers, queue_depth, "Process queue started");

        Self {
            submit_tx,
            shutdown_tx,
        }
    }

    /// Enqueue an asset for processing. Backpressure: waits when the queue
    /// is at depth, errors when the pool has shut down.
    pub async fn submit(&self, asset_id: Uuid) -> anyhow::Result<()> {
        self.submit_tx
            .send(asset_id)
            .await
            .map_err(|_| anyhow::anyhow!("process queue is shut down"))?;
        tracing::debug!(asset_id = %asset_id, "Asset queued for processing");
        Ok(())
    }

    /// Stop accepting work. In-flight tasks run to completion.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn worker_pool(
    pipeline: Arc<ImagePipeline>,
    mut submit_rx: mpsc::Receiver<Uuid>,
    mut shutdown_rx: mpsc::Receiver<()>,
    max_workers: usize,
) {
    let semaphore = Arc::new(Semaphore::new(max_workers));

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::info!("Process queue shutting down");
                break;
            }
            maybe_id = submit_rx.recv() => {
                let Some(asset_id) = maybe_id else {
                    break;
                };
                let permit = match semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    run_one(&pipeline, asset_id).await;
                });
            }
        }
    }
}

async fn run_one(pipeline: &ImagePipeline, asset_id: Uuid) {
    match pipeline.process_asset(asset_id).await {
        Ok(ProcessingOutcome::AlreadyProcessed) => {
            tracing::debug!(asset_id = %asset_id, "Asset already processed");
        }
        Ok(ProcessingOutcome::Processed(report)) => {
            tracing::info!(
                asset_id = %asset_id,
                tier = %report.tier,
                size_bytes = report.byte_size,
                "Asset processed"
            );
        }
        Err(e) => {
            tracing::error!(
                asset_id = %asset_id,
                kind = e.kind(),
                error = %e,
                "Image processing failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::build_pipeline;
    use photoflow_core::models::UploadedAsset;
    use photoflow_core::{AssetRecords, InMemoryRecords, PipelineConfig};
    use std::time::Duration;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(16, 16, image::Rgba([10, 20, 30, 255]));
        let mut buffer = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .unwrap();
        buffer
    }

    async fn wait_until_processed(records: &InMemoryRecords, id: Uuid) -> bool {
        for _ in 0..100 {
            if let Ok(record) = records.get(id).await {
                if record.blob.metadata.processed {
                    return true;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    #[tokio::test]
    async fn submitted_asset_gets_processed() {
        let scratch = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            scratch_dir: scratch.path().to_path_buf(),
            ..Default::default()
        };
        let records = Arc::new(InMemoryRecords::new());
        let pipeline = build_pipeline(&config, records.clone()).await.unwrap();

        let upload = UploadedAsset::new("queued.png", "image/png", png_bytes());
        let record = pipeline.ingest_upload(upload).await.unwrap();

        let queue = ProcessQueue::new(pipeline, 2, 16);
        queue.submit(record.id).await.unwrap();

        assert!(wait_until_processed(&records, record.id).await);
        queue.shutdown().await;
    }

    #[tokio::test]
    async fn failed_task_does_not_poison_the_pool() {
        let scratch = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            scratch_dir: scratch.path().to_path_buf(),
            ..Default::default()
        };
        let records = Arc::new(InMemoryRecords::new());
        let pipeline = build_pipeline(&config, records.clone()).await.unwrap();

        let upload = UploadedAsset::new("ok.png", "image/png", png_bytes());
        let record = pipeline.ingest_upload(upload).await.unwrap();

        let queue = ProcessQueue::new(pipeline, 1, 16);
        // Unknown id fails inside the worker and is swallowed there.
        queue.submit(Uuid::new_v4()).await.unwrap();
        queue.submit(record.id).await.unwrap();

        assert!(wait_until_processed(&records, record.id).await);
        queue.shutdown().await;
    }
}
