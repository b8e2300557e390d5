use image::{imageops::FilterType, DynamicImage, GenericImageView};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Smallest proportional size that covers the target box.
    ///
    /// Both returned sides are at least as large as the target, and at least one matches
    /// it exactly (up to rounding).
    pub fn cover_dimensions(
        orig_width: u32,
        orig_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> (u32, u32) {
        let scale_width = target_width as f64 / orig_width as f64;
        let scale_height = target_height as f64 / orig_height as f64;
        let scale = scale_width.max(scale_height);

        let width = ((orig_width as f64 * scale).round() as u32).max(target_width);
        let height = ((orig_height as f64 * scale).round() as u32).max(target_height);
        (width, height)
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Resize to cover `width`x`height`, then crop to exactly that box around the center.
    pub fn cover_crop(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (scaled_width, scaled_height) =
            Self::cover_dimensions(orig_width, orig_height, width, height);

        let scaled = if (scaled_width, scaled_height) == (orig_width, orig_height) {
            img.clone()
        } else {
            let filter = Self::select_filter(orig_width, orig_height, scaled_width, scaled_height);
            img.resize_exact(scaled_width, scaled_height, filter)
        };

        let x = (scaled_width - width) / 2;
        let y = (scaled_height - height) / 2;
        scaled.crop_imm(x, y, width, height)
    }
}
