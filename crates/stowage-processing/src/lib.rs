//! Stowage Processing Library
//!
//! The resize primitive used to derive image styles: decode, scale to cover the
//! target box, crop to the exact box around the center, re-encode.

pub mod image;

pub use crate::image::{ImageResize, ImageTransformer, ResizedImage, Resizer};
