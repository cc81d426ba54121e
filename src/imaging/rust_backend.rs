//! Pure Rust image backend built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` → `into_rgba8` |
//! | Encode | PNG via `image::RgbaImage::save_with_format` |
//!
//! Every filtered image is written as PNG regardless of its input format:
//! it is lossless and keeps the alpha channel.

use super::backend::{Dimensions, ImageBackend, SourceError, WriteError};
use image::{ImageError, ImageFormat, ImageReader, RgbaImage};
use std::io;
use std::path::Path;
use std::sync::LazyLock;

/// Extension written for every filtered image.
pub const OUTPUT_EXTENSION: &str = "png";

const CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has an extension we can decode. Content is not inspected.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Backend using the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

fn source_error(path: &Path, err: ImageError) -> SourceError {
    match err {
        ImageError::IoError(e) => SourceError::from_io(path, e),
        ImageError::Unsupported(_) => SourceError::UnsupportedFormat(path.to_path_buf()),
        other => SourceError::Corrupt {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, SourceError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| source_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<RgbaImage, SourceError> {
        let image = ImageReader::open(path)
            .map_err(|e| SourceError::from_io(path, e))?
            .with_guessed_format()
            .map_err(|e| SourceError::from_io(path, e))?
            .decode()
            .map_err(|e| source_error(path, e))?;
        Ok(image.into_rgba8())
    }

    fn encode(&self, image: &RgbaImage, path: &Path) -> Result<(), WriteError> {
        image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| WriteError {
                path: path.to_path_buf(),
                source: match e {
                    ImageError::IoError(io) => io,
                    other => io::Error::other(other),
                },
            })
    }
}
