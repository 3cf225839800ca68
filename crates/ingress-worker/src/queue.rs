//! SQS long-polling loop
//!
//! Receives up to `max_messages` messages at a time, runs them through
//! [`handle_batch`] and then deletes every received message regardless of the
//! per-message outcome. Dropped requests are not redelivered.

use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::{DeleteMessageBatchRequestEntry, Message};
use aws_sdk_sqs::Client;
use ingress_core::Config;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::batch::{handle_batch, QueueEvent, QueueRecord};
use crate::pipeline::Orchestrator;

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct SqsPoller {
    client: Client,
    queue_url: String,
    wait_time_secs: i32,
    max_messages: i32,
    orchestrator: Arc<Orchestrator>,
}

/// Convert received SQS messages into the batch event shape.
pub fn to_event(messages: &[Message]) -> QueueEvent {
    QueueEvent {
        records: messages
            .iter()
            .map(|message| QueueRecord {
                message_id: message.message_id().map(str::to_string),
                body: message.body().unwrap_or_default().to_string(),
            })
            .collect(),
    }
}

/// Delete entries for every message that carries a receipt handle.
fn delete_entries(messages: &[Message]) -> Vec<DeleteMessageBatchRequestEntry> {
    messages
        .iter()
        .enumerate()
        .filter_map(|(index, message)| {
            let handle = message.receipt_handle()?;
            DeleteMessageBatchRequestEntry::builder()
                .id(index.to_string())
                .receipt_handle(handle)
                .build()
                .ok()
        })
        .collect()
}

impl SqsPoller {
    pub fn new(
        client: Client,
        queue_url: impl Into<String>,
        wait_time_secs: i32,
        max_messages: i32,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            wait_time_secs,
            max_messages,
            orchestrator,
        }
    }

    pub async fn from_config(
        config: &Config,
        orchestrator: Arc<Orchestrator>,
    ) -> anyhow::Result<Self> {
        let queue_url = config
            .queue_url()
            .ok_or_else(|| anyhow::anyhow!("SQS_QUEUE_URL must be set to poll a queue"))?;
        let sdk_config = ingress_infra::load_sdk_config(config.s3_region()).await;

        Ok(Self::new(
            Client::new(&sdk_config),
            queue_url,
            config.queue_wait_time_secs(),
            config.queue_max_messages(),
            orchestrator,
        ))
    }

    /// Poll until `shutdown` resolves. A batch interrupted by shutdown is not
    /// deleted, so its messages become visible again after the queue's timeout.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        tracing::info!(queue_url = %self.queue_url, "SQS poller started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("SQS poller shutting down");
                    break;
                }
                result = self.poll_once() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "SQS poll failed");
                        sleep(ERROR_BACKOFF).await;
                    }
                }
            }
        }

        tracing::info!("SQS poller stopped");
    }

    /// Receive one batch, process it and acknowledge it. Returns the number of
    /// messages handled.
    pub async fn poll_once(&self) -> anyhow::Result<usize> {
        let received = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(self.max_messages)
            .wait_time_seconds(self.wait_time_secs)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("receive_message failed: {}", DisplayErrorContext(&e)))?;

        let messages = received.messages();
        if messages.is_empty() {
            tracing::trace!("No messages available in queue");
            return Ok(0);
        }

        let event = to_event(messages);
        let (_response, report) = handle_batch(&self.orchestrator, &event).await;
        tracing::debug!(counts = ?report.counts, "Batch report");

        let entries = delete_entries(messages);
        if !entries.is_empty() {
            let deleted = self
                .client
                .delete_message_batch()
                .queue_url(&self.queue_url)
                .set_entries(Some(entries))
                .send()
                .await
                .map_err(|e| {
                    anyhow::anyhow!("delete_message_batch failed: {}", DisplayErrorContext(&e))
                })?;

            for failed in deleted.failed() {
                tracing::warn!(
                    entry = %failed.id(),
                    code = %failed.code(),
                    message = ?failed.message(),
                    "Failed to delete message"
                );
            }
        }

        Ok(messages.len())
    }
}
