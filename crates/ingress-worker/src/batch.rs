//! Batch entrypoint
//!
//! Accepts the SQS event shape delivered to queue-triggered functions. Messages are
//! processed one after another; a failure in one never affects the others, and
//! the batch is always acknowledged.

use ingress_core::constants::BATCH_ACK_MESSAGE;
use ingress_core::models::IngestionOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pipeline::Orchestrator;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueueEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueueRecord {
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub body: String,
}

/// Response returned to the trigger once the whole batch has been handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl BatchResponse {
    pub fn acknowledged() -> Self {
        Self {
            status_code: 200,
            body: serde_json::json!({ "message": BATCH_ACK_MESSAGE }).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(flatten)]
    pub outcome: IngestionOutcome,
}

/// Per-message outcomes of one batch, for logs and tests.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<MessageOutcome>,
    pub counts: BTreeMap<&'static str, usize>,
}

impl BatchReport {
    fn record(&mut self, message_id: Option<String>, outcome: IngestionOutcome) {
        *self.counts.entry(outcome.label()).or_default() += 1;
        self.outcomes.push(MessageOutcome {
            message_id,
            outcome,
        });
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or_default()
    }
}

pub async fn handle_batch(
    orchestrator: &Orchestrator,
    event: &QueueEvent,
) -> (BatchResponse, BatchReport) {
    let mut report = BatchReport::default();

    for record in &event.records {
        let outcome = orchestrator.process_body(&record.body).await;
        report.record(record.message_id.clone(), outcome);
    }

    tracing::info!(
        messages = event.records.len(),
        counts = ?report.counts,
        "Batch processed"
    );

    (BatchResponse::acknowledged(), report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqs_event_shape() {
        let event: QueueEvent = serde_json::from_str(
            r#"{"Records": [
                {"messageId": "m-1", "body": "{\"url\": \"https://ex/a.png\"}", "eventSource": "aws:sqs"},
                {"body": "not json"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(event.records.len(), 2);
        assert_eq!(event.records[0].message_id.as_deref(), Some("m-1"));
        assert_eq!(event.records[1].message_id, None);
        assert_eq!(event.records[1].body, "not json");
    }

    #[test]
    fn missing_records_is_an_empty_batch() {
        let event: QueueEvent = serde_json::from_str("{}").unwrap();
        assert!(event.records.is_empty());
    }

    #[test]
    fn response_matches_trigger_contract() {
        let response = serde_json::to_value(BatchResponse::acknowledged()).unwrap();
        assert_eq!(response["statusCode"], 200);
        let body: serde_json::Value =
            serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["message"], BATCH_ACK_MESSAGE);
    }

    #[test]
    fn report_counts_by_outcome() {
        let mut report = BatchReport::default();
        report.record(
            Some("a".to_string()),
            IngestionOutcome::Rejected {
                reason: "bad".to_string(),
            },
        );
        report.record(
            None,
            IngestionOutcome::SkippedDuplicate {
                id: "h".to_string(),
            },
        );
        report.record(
            None,
            IngestionOutcome::Rejected {
                reason: "worse".to_string(),
            },
        );

        assert_eq!(report.count("rejected"), 2);
        assert_eq!(report.count("skipped_duplicate"), 1);
        assert_eq!(report.count("persisted"), 0);

        let json = serde_json::to_value(&report.outcomes[0]).unwrap();
        assert_eq!(json["message_id"], "a");
        assert_eq!(json["outcome"], "rejected");
    }
}
