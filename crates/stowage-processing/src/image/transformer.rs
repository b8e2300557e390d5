//! Image transformer - decode, cover-crop, encode

use crate::image::resize::ImageResize;
use bytes::Bytes;
use image::{GenericImageView, ImageFormat};
use std::io::Cursor;

/// Upper bound on the up-front allocation for an encoded output
const MAX_BUFFER_HINT: usize = 16 * 1024 * 1024;

/// Output of a resize: encoded bytes and the format they are in
#[derive(Debug, Clone)]
pub struct ResizedImage {
    pub data: Bytes,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

pub struct ImageTransformer;

impl ImageTransformer {
    /// Fill-then-center-crop `data` to exactly `width`x`height`.
    ///
    /// The source format is kept when it can be encoded; anything else is written as PNG.
    pub fn resize_to_fill(data: &[u8], width: u32, height: u32) -> Result<ResizedImage, anyhow::Error> {
        if width == 0 || height == 0 {
            return Err(anyhow::anyhow!(
                "Target dimensions must be positive, got {}x{}",
                width,
                height
            ));
        }

        let reader = image::ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let format = Self::output_format(reader.format());
        let img = reader.decode()?;

        let resized = ImageResize::cover_crop(&img, width, height);
        let (out_width, out_height) = resized.dimensions();

        // JPEG has no alpha channel
        let resized = if format == ImageFormat::Jpeg {
            image::DynamicImage::ImageRgb8(resized.to_rgb8())
        } else {
            resized
        };

        let mut buffer = Vec::with_capacity(Self::buffer_hint(out_width, out_height));
        resized.write_to(&mut Cursor::new(&mut buffer), format)?;

        tracing::debug!(
            width = out_width,
            height = out_height,
            format = ?format,
            size_bytes = buffer.len(),
            "Image resized"
        );

        Ok(ResizedImage {
            data: Bytes::from(buffer),
            format,
            width: out_width,
            height: out_height,
        })
    }

    /// Raw RGB size of the output, capped.
    fn buffer_hint(width: u32, height: u32) -> usize {
        (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(3)
            .min(MAX_BUFFER_HINT)
    }

    fn output_format(source: Option<ImageFormat>) -> ImageFormat {
        match source {
            Some(ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Some(ImageFormat::Gif) => ImageFormat::Gif,
            Some(ImageFormat::WebP) => ImageFormat::WebP,
            _ => ImageFormat::Png,
        }
    }
}
