//! Ingress Infrastructure Library
//!
//! Process-level plumbing shared by the worker binary:
//! - Telemetry initialization (tracing subscriber)
//! - AWS SDK configuration loading

#[cfg(feature = "observability-basic")]
pub mod telemetry;

#[cfg(feature = "aws")]
pub mod aws;

#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

#[cfg(feature = "aws")]
pub use aws::load_sdk_config;
