//! Per-pixel transform application.
//!
//! Pixels are independent, so the visit order is irrelevant. Pass-through
//! short-circuits to a plain copy instead of walking every pixel; for RGBA
//! input the result is identical either way.

use crate::filters::{PixelFn, Transform};
use image::{Rgba, RgbaImage};

/// Apply `transform` to an image the caller owns. Each job decodes its own
/// buffer, so the source file's pixels are never shared between jobs.
pub fn apply_in_place(image: &mut RgbaImage, transform: Transform) {
    if let Transform::Pixel(f) = transform {
        map_pixels(image, f);
    }
}

fn map_pixels(image: &mut RgbaImage, f: PixelFn) {
    for Rgba(channels) in image.pixels_mut() {
        *channels = f(*channels);
    }
}
