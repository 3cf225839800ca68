//! Error types module
//!
//! Every pipeline stage returns `Result<T, IngestError>`. The variant says how the
//! orchestrator treats the failure; no variant aborts sibling messages in a batch.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Warning level - for dropped requests and accepted inconsistencies
    Warn,
    /// Error level - for malformed requests and cleanup problems
    Error,
}

/// Coarse classification of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed request. Dropped before any network call, never retried.
    Rejection,
    /// Network, timeout, invalid link or undecodable content. Dropped for this request.
    SoftFailure,
    /// Record store write failed after the derivative was uploaded.
    PersistenceFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Soft failure: {0}")]
    SoftFailure(String),

    #[error("Image processing failed: {0}")]
    Processing(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

/// Result type for pipeline stages
pub type IngestResult<T> = Result<T, IngestError>;

impl IngestError {
    pub fn rejected(message: impl Into<String>) -> Self {
        IngestError::Rejected(message.into())
    }

    pub fn soft(message: impl Into<String>) -> Self {
        IngestError::SoftFailure(message.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            IngestError::Rejected(_) => FailureKind::Rejection,
            // Decode failures during normalization or hashing drop the request like any
            // other unusable content.
            IngestError::SoftFailure(_) | IngestError::Processing(_) => FailureKind::SoftFailure,
            IngestError::PersistenceFailure(_) => FailureKind::PersistenceFailure,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self.kind() {
            FailureKind::Rejection => LogLevel::Error,
            FailureKind::SoftFailure | FailureKind::PersistenceFailure => LogLevel::Warn,
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Rejected(format!("Invalid message body: {}", err))
    }
}
