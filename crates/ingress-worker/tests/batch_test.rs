//! Batch entrypoint integration tests.
//!
//! Run with: `cargo test -p ingress-worker --test batch_test`

mod helpers;

use helpers::fixtures::{base64_png, png_bytes, url_request};
use helpers::setup_pipeline;
use ingress_core::constants::BATCH_ACK_MESSAGE;
use ingress_worker::{handle_batch, QueueEvent, QueueRecord};

fn record(id: &str, body: String) -> QueueRecord {
    QueueRecord {
        message_id: Some(id.to_string()),
        body,
    }
}

#[tokio::test]
async fn test_failing_messages_do_not_affect_siblings() {
    let pipeline = setup_pipeline().await;
    let mut server = mockito::Server::new_async().await;
    server
        .mock("HEAD", "/a.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .create_async()
        .await;
    server
        .mock("GET", "/a.png")
        .with_status(200)
        .with_body(png_bytes())
        .create_async()
        .await;
    server
        .mock("HEAD", "/gone.png")
        .with_status(404)
        .create_async()
        .await;

    let event = QueueEvent {
        records: vec![
            record("bad-json", "{".to_string()),
            record(
                "no-bucket",
                serde_json::json!({"url": "k", "classification": "cat", "data_source": "s3_bucket"})
                    .to_string(),
            ),
            record(
                "gone",
                url_request(&format!("{}/gone.png", server.url()), "cat"),
            ),
            record(
                "good",
                url_request(&format!("{}/a.png", server.url()), "cat"),
            ),
            record(
                "same-again",
                serde_json::json!({
                    "url": base64_png(),
                    "classification": "cat",
                    "data_source": "body_image",
                })
                .to_string(),
            ),
        ],
    };

    let (response, report) = handle_batch(&pipeline.orchestrator, &event).await;

    assert_eq!(response.status_code, 200);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["message"], BATCH_ACK_MESSAGE);

    let labels: Vec<(&str, &str)> = report
        .outcomes
        .iter()
        .map(|o| (o.message_id.as_deref().unwrap_or_default(), o.outcome.label()))
        .collect();
    assert_eq!(
        labels,
        vec![
            ("bad-json", "rejected"),
            ("no-bucket", "rejected"),
            ("gone", "soft_failed"),
            ("good", "persisted"),
            ("same-again", "skipped_duplicate"),
        ]
    );
    assert_eq!(report.count("rejected"), 2);
    assert_eq!(pipeline.records.len().await, 1);
    assert!(pipeline.scratch_is_empty());
}

#[tokio::test]
async fn test_empty_batch_is_acknowledged() {
    let pipeline = setup_pipeline().await;
    let event: QueueEvent = serde_json::from_str(r#"{"Records": []}"#).unwrap();

    let (response, report) = handle_batch(&pipeline.orchestrator, &event).await;
    assert_eq!(response.status_code, 200);
    assert!(report.outcomes.is_empty());
}
