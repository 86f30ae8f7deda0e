//! Photoflow Core Library
//!
//! This crate provides core domain models, processing budgets, configuration,
//! and the record-store abstraction shared across all Photoflow components.

pub mod config;
pub mod constants;
pub mod models;
pub mod records;
pub mod storage_types;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use records::{AssetRecords, InMemoryRecords, RecordsError, RecordsResult};
pub use storage_types::StorageBackend;
