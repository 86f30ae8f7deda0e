//! Photoflow Processing Library
//!
//! Post-processing pipeline for uploaded images: ingest validation, EXIF
//! extraction, output-format planning, the two-tier compression ladder, and
//! the orchestrator that swaps the processed blob in for the original.

pub mod error;
pub mod exif;
pub mod ladder;
pub mod pipeline;
pub mod planner;
pub mod transcode;
pub mod validator;

// Re-export commonly used types
pub use error::PipelineError;
pub use exif::ExifExtractor;
pub use ladder::{CompressionLadder, EncodedImage, Tier};
pub use pipeline::{ImagePipeline, ProcessingOutcome, ProcessingReport};
pub use planner::{FormatPlanner, OutputKind, ProcessingPlan};
pub use transcode::{Transcoder, TranscodeError};
pub use validator::{IngestValidator, ValidationError};
