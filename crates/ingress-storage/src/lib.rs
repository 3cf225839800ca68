//! Ingress Storage Library
//!
//! Object store access for the ingestion worker: the [`Storage`] trait for writing
//! derivatives into the worker's own bucket, and the [`BucketReader`] trait for
//! anonymous reads of source images from arbitrary named buckets.
//!
//! # Key format
//!
//! - **Derivatives**: `data_resized/{classification}/{filename}.jpeg`
//! - **Bucket sources**: `{url}.jpg` inside the bucket named by the request
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_bucket_reader, create_storage};
pub use ingress_core::StorageBackend;
pub use keys::derivative_key;
#[cfg(feature = "storage-local")]
pub use local::{LocalBucketReader, LocalStorage};
#[cfg(feature = "storage-s3")]
pub use s3::{S3BucketReader, S3Storage};
pub use traits::{BucketReader, Storage, StorageError, StorageResult};
