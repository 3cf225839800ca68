//! Domain models for one ingestion attempt.

pub mod attributes;
pub mod fingerprint;
pub mod outcome;
pub mod record;
pub mod request;
pub mod source;

pub use attributes::flatten_attributes;
pub use fingerprint::FingerprintSet;
pub use outcome::IngestionOutcome;
pub use record::ImageRecord;
pub use request::{DataSource, IngestionRequest};
pub use source::{FileExtension, ResolvedSource, SourceLocation};
