//! Bounding-box resize that never upscales.

use image::DynamicImage;

use crate::config::ResizeFilter;

/// Compute the size of `width`x`height` scaled down to fit in a
/// `max_dimension` square, preserving aspect ratio.
///
/// Images that already fit keep their size. Each edge is at least 1 pixel.
pub fn fit_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }

    let longest = width.max(height) as f64;
    let scale = max_dimension as f64 / longest;
    let scaled = |edge: u32| ((edge as f64 * scale).round() as u32).clamp(1, max_dimension);

    if width >= height {
        (max_dimension, scaled(height))
    } else {
        (scaled(width), max_dimension)
    }
}

/// Shrinks decoded images to the configured bounding box.
pub struct ThumbnailGenerator {
    max_dimension: u32,
    filter: ResizeFilter,
}

impl ThumbnailGenerator {
    /// Create a generator for the given bounding box and filter.
    pub fn new(max_dimension: u32, filter: ResizeFilter) -> Self {
        Self {
            max_dimension,
            filter,
        }
    }

    /// Target size for an image of the given dimensions.
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        fit_dimensions(width, height, self.max_dimension)
    }

    /// Resize `image` to fit, handing it back untouched when it already does.
    pub fn generate(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = (image.width(), image.height());
        let (target_w, target_h) = self.target_size(width, height);
        if (target_w, target_h) == (width, height) {
            return image;
        }
        tracing::trace!("  Resize {width}x{height} -> {target_w}x{target_h}");
        image.resize_exact(target_w, target_h, self.filter.into())
    }
}
