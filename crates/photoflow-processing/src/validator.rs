use photoflow_core::constants;
use photoflow_core::models::UploadedAsset;

/// Ingest validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Unsupported content type: {content_type} (allowed: {allowed:?})")]
    UnsupportedContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("GIF uploads are not supported")]
    GifNotSupported,

    #[error("Empty file")]
    EmptyFile,
}

/// Upload validator
///
/// Checks declared size and content type before any decode work. Has no side
/// effects; a rejected upload leaves nothing behind.
pub struct IngestValidator {
    max_upload_bytes: usize,
    allowed_content_types: Vec<String>,
}

impl IngestValidator {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self {
            max_upload_bytes,
            allowed_content_types: constants::ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn validate(&self, upload: &UploadedAsset) -> Result<(), ValidationError> {
        self.validate_file_size(upload.byte_size())?;
        self.validate_content_type(&upload.content_type)?;
        Ok(())
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_upload_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_upload_bytes,
            });
        }

        Ok(())
    }

    /// Validate content type. GIF gets its own rejection so callers can
    /// explain that animated uploads are unsupported.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();

        if normalized == "image/gif" {
            return Err(ValidationError::GifNotSupported);
        }

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::UnsupportedContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }
}
