use serde::Serialize;

use crate::error::{FailureKind, IngestError};

/// Terminal result of processing one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestionOutcome {
    /// New fingerprint: derivative uploaded and record written.
    Persisted { id: String, derivative_key: String },
    /// Derivative uploaded but the record write failed. The upload is not rolled back.
    PersistedWithoutRecord {
        id: String,
        derivative_key: String,
        reason: String,
    },
    /// Crop-resistant hash already present in the store.
    SkippedDuplicate { id: String },
    Rejected { reason: String },
    SoftFailed { reason: String },
}

impl IngestionOutcome {
    /// Map a failed stage to its terminal outcome.
    pub fn from_error(err: &IngestError) -> Self {
        match err.kind() {
            FailureKind::Rejection => IngestionOutcome::Rejected {
                reason: err.to_string(),
            },
            FailureKind::SoftFailure | FailureKind::PersistenceFailure => {
                IngestionOutcome::SoftFailed {
                    reason: err.to_string(),
                }
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IngestionOutcome::Persisted { .. } => "persisted",
            IngestionOutcome::PersistedWithoutRecord { .. } => "persisted_without_record",
            IngestionOutcome::SkippedDuplicate { .. } => "skipped_duplicate",
            IngestionOutcome::Rejected { .. } => "rejected",
            IngestionOutcome::SoftFailed { .. } => "soft_failed",
        }
    }
}
