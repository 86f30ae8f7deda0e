//! Photoflow Worker Library
//!
//! Background processing: an explicit task queue in front of the pipeline.
//! Upload acceptance and processing are decoupled; callers submit asset ids
//! and a bounded worker pool drains them.

pub mod bootstrap;
pub mod queue;
pub mod telemetry;

// Re-export commonly used types
pub use bootstrap::build_pipeline;
pub use queue::ProcessQueue;
pub use telemetry::init_telemetry;
