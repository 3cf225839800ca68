//! Ingress Processing Library
//!
//! CPU-bound image work for the ingestion pipeline. Everything here is synchronous;
//! async callers run it on the blocking pool.
//!
//! - [`Normalizer`]: re-encode any decodable input as a baseline RGB JPEG
//! - [`DerivativeRenderer`]: fixed-size thumbnail uploaded next to the record
//! - [`FingerprintEngine`]: crop-resistant, perceptual and color hashes

pub mod error;
pub mod fingerprint;
pub mod image;

pub use error::ProcessingError;
pub use fingerprint::FingerprintEngine;
pub use self::image::{DerivativeRenderer, Normalizer};
