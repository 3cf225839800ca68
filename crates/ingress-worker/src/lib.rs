//! Ingress Worker
//!
//! Per-message pipeline and its outer surfaces:
//!
//! ```text
//! QueueEvent -> handle_batch -> Orchestrator::process (one message at a time)
//!     resolve -> fetch -> normalize -> fingerprint -> dedup check
//!         -> derivative upload -> conditional record insert -> cleanup
//! ```
//!
//! Stage errors are [`IngestError`](ingress_core::IngestError)s; the orchestrator turns
//! the first one into an [`IngestionOutcome`](ingress_core::models::IngestionOutcome) so
//! a failing message never affects its siblings.

pub mod batch;
pub mod context;
pub mod fetcher;
pub mod pipeline;
pub mod queue;
pub mod resolver;
pub mod scratch;

pub use batch::{
    handle_batch, BatchReport, BatchResponse, MessageOutcome, QueueEvent, QueueRecord,
};
pub use context::WorkerContext;
pub use fetcher::Fetcher;
pub use pipeline::Orchestrator;
pub use queue::SqsPoller;
pub use resolver::{LinkCheck, SourceResolver};
pub use scratch::Scratch;
