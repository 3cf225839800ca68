//! Ingress Core Library
//!
//! Domain models, the stage error taxonomy, configuration and constants shared by
//! every ingress crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, IngressConfig, LogFormat, PipelineSettings};
pub use error::{FailureKind, IngestError, IngestResult, LogLevel};
pub use storage_types::{RecordStoreBackend, StorageBackend};
