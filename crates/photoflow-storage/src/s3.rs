use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use photoflow_core::models::{BlobMetadata, StoredBlob};
use photoflow_core::StorageBackend;

use crate::keys;
use crate::traits::{BlobStore, StorageError, StorageResult};

/// S3 blob store
///
/// Blob metadata rides as S3 object metadata, so `head` rebuilds the full
/// [`StoredBlob`] from a HeadObject call alone.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3BlobStore instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(S3BlobStore {
            client: Client::from_conf(builder.build()),
            bucket,
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn create(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
        metadata: BlobMetadata,
    ) -> StorageResult<StoredBlob> {
        let key = keys::generate_key(filename);
        let size = data.len() as u64;
        let checksum = keys::checksum_hex(&data);
        let object_metadata = keys::encode_metadata(filename, &checksum, &metadata);

        let start = std::time::Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .set_metadata(Some(object_metadata.into_iter().collect()))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 put_object failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put_object successful"
        );

        Ok(StoredBlob {
            key,
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            byte_size: size,
            checksum,
            metadata,
        })
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(se) if se.err().is_no_such_key() => {
                    StorageError::NotFound(key.to_string())
                }
                _ => {
                    tracing::error!(
                        error = %e,
                        bucket = %self.bucket,
                        key = %key,
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "S3 get_object failed"
                    );
                    StorageError::DownloadFailed(e.to_string())
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .into_bytes()
            .to_vec();

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 get_object successful"
        );

        Ok(data)
    }

    async fn head(&self, key: &str) -> StorageResult<StoredBlob> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(se) if se.err().is_not_found() => {
                    StorageError::NotFound(key.to_string())
                }
                _ => StorageError::BackendError(e.to_string()),
            })?;

        let map: BTreeMap<String, String> = output
            .metadata()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        let (filename, checksum, metadata) = keys::decode_metadata(&map);

        Ok(StoredBlob {
            key: key.to_string(),
            filename,
            content_type: output
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string(),
            byte_size: output.content_length().unwrap_or(0) as u64,
            checksum,
            metadata,
        })
    }

    async fn purge(&self, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete_object failed"
                );
                StorageError::DeleteFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete_object successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(se)) if se.err().is_not_found() => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
