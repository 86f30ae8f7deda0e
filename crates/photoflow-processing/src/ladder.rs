//! Two-tier compression ladder.
//!
//! The primary tier encodes toward the planned container at full quality
//! settings. If the result blows the processed-size budget, the fallback tier
//! starts over from the original bytes with a smaller dimension cap and an
//! aggressive JPEG quality. Output size is measured from a scratch file on
//! disk, the same number a storage backend would see.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use photoflow_core::PipelineConfig;

use crate::error::PipelineError;
use crate::planner::ProcessingPlan;
use crate::transcode::{TranscodeError, Transcoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Fallback,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Primary => write!(f, "primary"),
            Tier::Fallback => write!(f, "fallback"),
        }
    }
}

/// One finished encode, ready for storage.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Size as measured on disk, not the in-memory buffer length.
    pub byte_size: u64,
    pub content_type: String,
    pub filename: String,
    pub tier: Tier,
}

pub struct CompressionLadder {
    scratch_dir: PathBuf,
    max_processed_bytes: u64,
    max_dimension: u32,
    fallback_dimension: u32,
    convert_quality: u8,
    fallback_quality: u8,
    tier_deadline_secs: u64,
}

impl CompressionLadder {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            scratch_dir: config.scratch_dir.clone(),
            max_processed_bytes: config.max_processed_bytes as u64,
            max_dimension: config.max_dimension,
            fallback_dimension: config.fallback_dimension,
            convert_quality: config.convert_quality,
            fallback_quality: config.fallback_quality,
            tier_deadline_secs: config.tier_deadline_secs,
        }
    }

    /// Run the ladder against the original upload bytes. The fallback tier
    /// never reuses the primary tier's output; it decodes the original again.
    pub async fn run(
        &self,
        original: Vec<u8>,
        plan: &ProcessingPlan,
    ) -> Result<EncodedImage, PipelineError> {
        let original = Arc::new(original);

        let first = self
            .encode_tier(Arc::clone(&original), plan.clone(), Tier::Primary)
            .await?;
        if first.byte_size <= self.max_processed_bytes {
            return Ok(first);
        }

        tracing::warn!(
            size_bytes = first.byte_size,
            max_bytes = self.max_processed_bytes,
            content_type = %first.content_type,
            "Primary encode over budget, retrying with fallback tier"
        );

        let second = self
            .encode_tier(original, plan.fallback(), Tier::Fallback)
            .await?;
        if second.byte_size <= self.max_processed_bytes {
            return Ok(second);
        }

        Err(PipelineError::SizeBudgetExceeded {
            size: second.byte_size,
            max: self.max_processed_bytes,
        })
    }

    async fn encode_tier(
        &self,
        original: Arc<Vec<u8>>,
        plan: ProcessingPlan,
        tier: Tier,
    ) -> Result<EncodedImage, PipelineError> {
        let (max_dimension, quality) = match tier {
            Tier::Primary => {
                // Passthrough containers keep the encoder defaults; only a
                // container conversion pins the quality.
                let quality = plan.convert.then_some(self.convert_quality);
                (self.max_dimension, quality)
            }
            Tier::Fallback => (self.fallback_dimension, Some(self.fallback_quality)),
        };

        let scratch_dir = self.scratch_dir.clone();
        let deadline = Duration::from_secs(self.tier_deadline_secs);
        let handle = tokio::task::spawn_blocking(move || {
            encode_blocking(&original, plan, max_dimension, quality, &scratch_dir, tier)
        });

        match tokio::time::timeout(deadline, handle).await {
            Err(_) => Err(PipelineError::DeadlineExceeded {
                tier,
                secs: self.tier_deadline_secs,
            }),
            Ok(Err(join_err)) => Err(PipelineError::Unexpected(anyhow::anyhow!(
                "encode task panicked: {join_err}"
            ))),
            Ok(Ok(result)) => result.map_err(PipelineError::from),
        }
    }
}

fn encode_blocking(
    original: &[u8],
    plan: ProcessingPlan,
    max_dimension: u32,
    quality: Option<u8>,
    scratch_dir: &Path,
    tier: Tier,
) -> Result<EncodedImage, TranscodeError> {
    let img = Transcoder::decode(original)?;
    let img = Transcoder::normalize_color(img);
    let img = Transcoder::resize_to_limit(img, max_dimension);

    let bytes = Transcoder::encode(&img, plan.format, quality)?;
    let (width, height) = Transcoder::read_dimensions(&bytes)?;
    let byte_size = measure_on_disk(&bytes, scratch_dir)?;

    Ok(EncodedImage {
        bytes,
        width,
        height,
        byte_size,
        content_type: plan.content_type,
        filename: plan.filename,
        tier,
    })
}

/// Write the encoded bytes to a scratch file and read the size back. The
/// temp file is removed when it drops, on the error paths included.
fn measure_on_disk(bytes: &[u8], scratch_dir: &Path) -> Result<u64, TranscodeError> {
    let mut file = tempfile::Builder::new()
        .prefix("photoflow-")
        .tempfile_in(scratch_dir)
        .map_err(|e| TranscodeError::Encode(format!("scratch file create failed: {e}")))?;
    file.write_all(bytes)
        .map_err(|e| TranscodeError::Encode(format!("scratch write failed: {e}")))?;
    file.flush()
        .map_err(|e| TranscodeError::Encode(format!("scratch flush failed: {e}")))?;

    let size = file
        .as_file()
        .metadata()
        .map_err(|e| TranscodeError::Encode(format!("scratch stat failed: {e}")))?
        .len();
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::FormatPlanner;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    /// Deterministic pseudo-noise; compresses poorly so sizes are predictable.
    fn noise(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let v = x
                .wrapping_mul(7919)
                .wrapping_add(y.wrapping_mul(104_729))
                ^ x.wrapping_mul(y).wrapping_add(13);
            *pixel = Rgb([v as u8, (v >> 8) as u8, (v >> 16) as u8]);
        }
        DynamicImage::ImageRgb8(img)
    }

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn config_with_scratch(scratch: &Path) -> PipelineConfig {
        PipelineConfig {
            scratch_dir: scratch.to_path_buf(),
            ..Default::default()
        }
    }

    fn scratch_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn small_upload_stays_on_primary_tier() {
        let scratch = tempfile::tempdir().unwrap();
        let ladder = CompressionLadder::new(&config_with_scratch(scratch.path()));
        let plan = FormatPlanner::plan("tiny.png", "image/png");

        let encoded = ladder.run(png_bytes(&noise(64, 64)), &plan).await.unwrap();
        assert_eq!(encoded.tier, Tier::Primary);
        assert_eq!(encoded.content_type, "image/png");
        assert_eq!(encoded.filename, "tiny.png");
        assert_eq!((encoded.width, encoded.height), (64, 64));
        assert_eq!(encoded.byte_size, encoded.bytes.len() as u64);
    }

    #[tokio::test]
    async fn conversion_plan_produces_jpeg() {
        let scratch = tempfile::tempdir().unwrap();
        let ladder = CompressionLadder::new(&config_with_scratch(scratch.path()));
        let plan = FormatPlanner::plan("IMG_1.HEIC", "image/heic");

        let encoded = ladder.run(png_bytes(&noise(64, 64)), &plan).await.unwrap();
        assert_eq!(encoded.content_type, "image/jpeg");
        assert_eq!(encoded.filename, "IMG_1.jpg");
        // JPEG magic bytes
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn oversized_primary_drops_to_fallback() {
        let scratch = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            scratch_dir: scratch.path().to_path_buf(),
            max_processed_bytes: 60_000,
            max_dimension: 400,
            fallback_dimension: 100,
            ..Default::default()
        };
        let ladder = CompressionLadder::new(&config);
        let plan = FormatPlanner::plan("big.png", "image/png");

        // 400x400 noise as PNG lands well over 60KB; 100x100 JPEG does not.
        let encoded = ladder
            .run(png_bytes(&noise(400, 400)), &plan)
            .await
            .unwrap();
        assert_eq!(encoded.tier, Tier::Fallback);
        assert_eq!(encoded.content_type, "image/jpeg");
        assert_eq!(encoded.filename, "big.jpg");
        assert!(encoded.width <= 100 && encoded.height <= 100);
        assert!(encoded.byte_size <= 60_000);
    }

    #[tokio::test]
    async fn both_tiers_over_budget_fails_with_actual_size() {
        let scratch = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            scratch_dir: scratch.path().to_path_buf(),
            max_processed_bytes: 10,
            ..Default::default()
        };
        let ladder = CompressionLadder::new(&config);
        let plan = FormatPlanner::plan("huge.png", "image/png");

        let result = ladder.run(png_bytes(&noise(200, 200)), &plan).await;
        match result {
            Err(PipelineError::SizeBudgetExceeded { size, max }) => {
                assert!(size > 10);
                assert_eq!(max, 10);
            }
            other => panic!("expected SizeBudgetExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scratch_dir_is_clean_after_success_and_failure() {
        let scratch = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            scratch_dir: scratch.path().to_path_buf(),
            max_processed_bytes: 10,
            ..Default::default()
        };
        let ladder = CompressionLadder::new(&config);
        let plan = FormatPlanner::plan("a.png", "image/png");

        let before = scratch_entries(scratch.path());
        ladder.run(png_bytes(&noise(200, 200)), &plan).await.ok();

        let ok_config = config_with_scratch(scratch.path());
        let ok_ladder = CompressionLadder::new(&ok_config);
        ok_ladder
            .run(png_bytes(&noise(32, 32)), &plan)
            .await
            .unwrap();

        assert_eq!(scratch_entries(scratch.path()), before);
    }

    #[tokio::test]
    async fn undecodable_bytes_surface_an_encoding_error() {
        let scratch = tempfile::tempdir().unwrap();
        let ladder = CompressionLadder::new(&config_with_scratch(scratch.path()));
        let plan = FormatPlanner::plan("corrupt.heic", "image/heic");

        let result = ladder.run(b"not an image at all".to_vec(), &plan).await;
        assert!(matches!(result, Err(PipelineError::Encoding(_))));
    }
}
