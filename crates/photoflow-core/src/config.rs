//! Configuration module
//!
//! Environment-driven configuration for the processing pipeline: storage
//! backend selection, scratch directory, encoding budgets, and worker sizing.

use std::env;
use std::path::PathBuf;

use crate::constants;
use crate::storage_types::StorageBackend;

const MAX_WORKERS: usize = 4;
const TIER_DEADLINE_SECS: u64 = 30;
const QUEUE_DEPTH: usize = 256;

/// Pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub environment: String,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    // Processing configuration
    pub scratch_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_processed_bytes: usize,
    pub max_dimension: u32,
    pub fallback_dimension: u32,
    pub convert_quality: u8,
    pub fallback_quality: u8,
    pub tier_deadline_secs: u64,
    // Worker configuration
    pub max_workers: usize,
    pub queue_depth: usize,
}

impl PipelineConfig {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend =
            env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|s| match s.to_lowercase().as_str() {
                    "s3" => Some(StorageBackend::S3),
                    "local" => Some(StorageBackend::Local),
                    "memory" => Some(StorageBackend::Memory),
                    _ => None,
                });

        let max_upload_mb = constants::MAX_UPLOAD_BYTES / (1024 * 1024);
        let max_processed_mb = constants::MAX_PROCESSED_BYTES / (1024 * 1024);

        let config = PipelineConfig {
            environment,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or_else(|| env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            scratch_dir: env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            max_upload_bytes: env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| max_upload_mb.to_string())
                .parse::<usize>()
                .unwrap_or(max_upload_mb)
                * 1024
                * 1024,
            max_processed_bytes: env::var("MAX_PROCESSED_SIZE_MB")
                .unwrap_or_else(|_| max_processed_mb.to_string())
                .parse::<usize>()
                .unwrap_or(max_processed_mb)
                * 1024
                * 1024,
            max_dimension: env::var("MAX_DIMENSION")
                .unwrap_or_else(|_| constants::MAX_DIMENSION.to_string())
                .parse()
                .unwrap_or(constants::MAX_DIMENSION),
            fallback_dimension: env::var("FALLBACK_DIMENSION")
                .unwrap_or_else(|_| constants::FALLBACK_DIMENSION.to_string())
                .parse()
                .unwrap_or(constants::FALLBACK_DIMENSION),
            convert_quality: env::var("CONVERT_QUALITY")
                .unwrap_or_else(|_| constants::CONVERT_QUALITY.to_string())
                .parse()
                .unwrap_or(constants::CONVERT_QUALITY),
            fallback_quality: env::var("FALLBACK_QUALITY")
                .unwrap_or_else(|_| constants::FALLBACK_QUALITY.to_string())
                .parse()
                .unwrap_or(constants::FALLBACK_QUALITY),
            tier_deadline_secs: env::var("TIER_DEADLINE_SECS")
                .unwrap_or_else(|_| TIER_DEADLINE_SECS.to_string())
                .parse()
                .unwrap_or(TIER_DEADLINE_SECS),
            max_workers: env::var("MAX_WORKERS")
                .unwrap_or_else(|_| MAX_WORKERS.to_string())
                .parse()
                .unwrap_or(MAX_WORKERS),
            queue_depth: env::var("QUEUE_DEPTH")
                .unwrap_or_else(|_| QUEUE_DEPTH.to_string())
                .parse()
                .unwrap_or(QUEUE_DEPTH),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_processed_bytes > self.max_upload_bytes {
            return Err(anyhow::anyhow!(
                "MAX_PROCESSED_SIZE_MB cannot exceed MAX_UPLOAD_SIZE_MB"
            ));
        }

        if self.fallback_dimension > self.max_dimension {
            return Err(anyhow::anyhow!(
                "FALLBACK_DIMENSION cannot exceed MAX_DIMENSION"
            ));
        }

        if self.max_workers == 0 {
            return Err(anyhow::anyhow!("MAX_WORKERS must be at least 1"));
        }

        // Validate storage backend configuration
        let backend = self.storage_backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {
                // No external configuration required.
            }
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            environment: "development".to_string(),
            storage_backend: Some(StorageBackend::Memory),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
            scratch_dir: env::temp_dir(),
            max_upload_bytes: constants::MAX_UPLOAD_BYTES,
            max_processed_bytes: constants::MAX_PROCESSED_BYTES,
            max_dimension: constants::MAX_DIMENSION,
            fallback_dimension: constants::FALLBACK_DIMENSION,
            convert_quality: constants::CONVERT_QUALITY,
            fallback_quality: constants::FALLBACK_QUALITY,
            tier_deadline_secs: TIER_DEADLINE_SECS,
            max_workers: MAX_WORKERS,
            queue_depth: QUEUE_DEPTH,
        }
    }
}
