//! Shared test utilities: job builders and on-disk image fixtures.

use crate::filters::{Filter, Transform};
use crate::job::{JobDescriptor, JobLabel, OTHER_FILE_COST, SourceKind};
use image::RgbaImage;
use std::path::{Path, PathBuf};

// =========================================================================
// Job builders
// =========================================================================

/// A pass-through image job with the given cost, labelled `ORIGINAL`/`item`.
pub fn job(item: &str, cost: u64) -> JobDescriptor {
    JobDescriptor {
        source: PathBuf::from(format!("/src/{item}.png")),
        kind: SourceKind::Image,
        transform: Transform::Passthrough,
        destination: None,
        estimated_cost: cost,
        label: JobLabel::new("ORIGINAL", item),
    }
}

/// An image job for `filter` on `source`.
pub fn image_job(source: &Path, filter: Filter, destination: Option<PathBuf>) -> JobDescriptor {
    JobDescriptor {
        source: source.to_path_buf(),
        kind: SourceKind::Image,
        transform: filter.transform(),
        destination,
        estimated_cost: 1,
        label: JobLabel::new(filter.name(), stem(source)),
    }
}

/// A non-image job labelled with `filter_name`.
pub fn other_job(source: &Path, filter_name: &str, destination: Option<PathBuf>) -> JobDescriptor {
    JobDescriptor {
        source: source.to_path_buf(),
        kind: SourceKind::Other,
        transform: Transform::Passthrough,
        destination,
        estimated_cost: OTHER_FILE_COST,
        label: JobLabel::new(filter_name, stem(source)),
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// =========================================================================
// Fixtures
// =========================================================================

/// Write `image` as a PNG, creating parent directories.
pub fn write_png(path: &Path, image: &RgbaImage) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// A `width` x `height` gradient image.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
}
