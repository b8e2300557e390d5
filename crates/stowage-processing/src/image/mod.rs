//! Image processing module

pub mod resize;
pub mod transformer;

pub use resize::ImageResize;
pub use transformer::{ImageTransformer, ResizedImage};

/// Resize primitive used to derive image styles.
///
/// The output must be exactly `width`x`height`.
pub trait Resizer: Send + Sync {
    fn resize_to_fill(&self, data: &[u8], width: u32, height: u32) -> Result<ResizedImage, anyhow::Error>;
}

impl Resizer for ImageTransformer {
    fn resize_to_fill(&self, data: &[u8], width: u32, height: u32) -> Result<ResizedImage, anyhow::Error> {
        ImageTransformer::resize_to_fill(data, width, height)
    }
}
