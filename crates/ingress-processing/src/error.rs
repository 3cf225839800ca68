use ingress_core::IngestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProcessingError> for IngestError {
    fn from(err: ProcessingError) -> Self {
        IngestError::Processing(err.to_string())
    }
}
