//! ingress-worker: image ingestion from an SQS queue or a saved batch event.
//!
//! Configuration comes from the environment (and `.env`); see `ingress_core::Config`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ingress_core::Config;
use ingress_worker::{handle_batch, Orchestrator, QueueEvent, SqsPoller, WorkerContext};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ingress-worker", about = "Image ingestion worker", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Long-poll SQS_QUEUE_URL until interrupted
    Poll,
    /// Process one batch event read from a JSON file
    Process {
        /// Path to an SQS event (`{"Records": [{"body": "..."}]}`)
        event: PathBuf,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;

    ingress_infra::init_telemetry(config.log_format(), "ingress-worker", config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let ctx = WorkerContext::from_config(&config).await?;
    let orchestrator = Arc::new(Orchestrator::new(ctx));

    match cli.command {
        Commands::Poll => {
            let poller = SqsPoller::from_config(&config, orchestrator).await?;
            poller.run(shutdown_signal()).await;
        }
        Commands::Process { event } => {
            let raw = tokio::fs::read_to_string(&event)
                .await
                .with_context(|| format!("Failed to read event file {}", event.display()))?;
            let event: QueueEvent =
                serde_json::from_str(&raw).context("Event file is not a valid queue event")?;

            let (response, report) = handle_batch(&orchestrator, &event).await;
            tracing::info!(counts = ?report.counts, "Batch finished");
            print_json(&response)?;
        }
    }

    Ok(())
}
