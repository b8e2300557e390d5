//! Image style derivation
//!
//! Styles are rendered from the canonical artifact already in object storage, so this
//! runs independently of (and after) the migration of the original.

pub mod generator;

pub use generator::{DerivativeGenerator, DerivativeReport, StyleFailure};
