//! Image normalization and derivative rendering

pub mod derivative;
pub mod icc;
pub mod normalizer;

pub use derivative::DerivativeRenderer;
pub use normalizer::Normalizer;
