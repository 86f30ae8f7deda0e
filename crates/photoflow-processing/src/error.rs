use photoflow_core::RecordsError;
use photoflow_storage::StorageError;

use crate::ladder::Tier;
use crate::transcode::TranscodeError;
use crate::validator::ValidationError;

/// Every way a pipeline run can fail. Callers get the full picture and
/// decide themselves whether to swallow, retry, or propagate.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] TranscodeError),

    #[error("Processed image still exceeds budget: {size} bytes (max: {max} bytes)")]
    SizeBudgetExceeded { size: u64, max: u64 },

    #[error("{tier} encode exceeded deadline of {secs}s")]
    DeadlineExceeded { tier: Tier, secs: u64 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Records(#[from] RecordsError),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl PipelineError {
    /// Stable label for log fields and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation",
            PipelineError::Encoding(_) => "encoding",
            PipelineError::SizeBudgetExceeded { .. } => "size_budget",
            PipelineError::DeadlineExceeded { .. } => "deadline",
            PipelineError::Storage(_) => "storage",
            PipelineError::Records(_) => "records",
            PipelineError::Unexpected(_) => "unexpected",
        }
    }
}
