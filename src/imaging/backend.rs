//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the three things the rest of the crate
//! needs from an image library: read dimensions cheaply, decode to RGBA, and
//! write the filtered result. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).
//!
//! Errors are split by who is at fault. A [`SourceError`] means one input
//! item is unusable and only that job fails. A [`WriteError`] means the
//! destination could not be written, which points at the environment and
//! aborts the run.

use image::RgbaImage;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a source item could not be read.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Can't find image at {0}")]
    NotFound(PathBuf),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Can't load image {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl SourceError {
    /// Classify an I/O error raised while opening or reading `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => SourceError::PermissionDenied(path.to_path_buf()),
            _ => SourceError::Corrupt {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }
}

/// A destination write failed.
#[derive(Error, Debug)]
#[error("Failed to write {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn pixels(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Trait for image backends.
///
/// Implementations must be `Sync`: one backend is shared by every worker.
pub trait ImageBackend: Sync {
    /// Read image dimensions without decoding pixel data.
    fn identify(&self, path: &Path) -> Result<Dimensions, SourceError>;

    /// Decode an image into a private RGBA buffer.
    fn decode(&self, path: &Path) -> Result<RgbaImage, SourceError>;

    /// Persist `image` at `path`. The output format is fixed by the backend.
    fn encode(&self, image: &RgbaImage, path: &Path) -> Result<(), WriteError>;
}

impl<T: ImageBackend + ?Sized> ImageBackend for &T {
    fn identify(&self, path: &Path) -> Result<Dimensions, SourceError> {
        (**self).identify(path)
    }

    fn decode(&self, path: &Path) -> Result<RgbaImage, SourceError> {
        (**self).decode(path)
    }

    fn encode(&self, image: &RgbaImage, path: &Path) -> Result<(), WriteError> {
        (**self).encode(image, path)
    }
}
