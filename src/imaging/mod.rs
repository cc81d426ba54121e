//! Image I/O and pixel transforms, in pure Rust.
//!
//! The module is split into:
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`] (identify, decode, encode)
//! - **Transform**: applying a [`Transform`](crate::filters::Transform) to a decoded image

pub mod backend;
pub mod rust_backend;
pub mod transform;

pub use backend::{Dimensions, ImageBackend, SourceError, WriteError};
pub use rust_backend::{OUTPUT_EXTENSION, RustBackend, is_image, supported_input_extensions};
pub use transform::apply_in_place;
