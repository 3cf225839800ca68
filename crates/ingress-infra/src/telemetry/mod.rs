//! Telemetry initialization
//!
//! Logs go to stdout through `tracing_subscriber::fmt`, plain or JSON. The filter
//! comes from `RUST_LOG`, defaulting to info for the ingress crates.

mod init_basic;

pub use init_basic::init_telemetry;
