//! Image codec layer: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode + orient** | `image::ImageReader` + `rexif` orientation |
//! | **Camera metadata** | `rexif` |
//! | **Crop / resize** | `image::DynamicImage` |
//! | **Encode** | `image` encoders, format chosen by the original extension |
//!
//! The module is split into:
//! - **Parameters**: quality and the accepted-extension table
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, DecodedImage, ImageBackend, ImageMetadata};
pub use params::{ACCEPTED_EXTENSIONS, Quality, format_for_extension, is_accepted_extension};
pub use rust_backend::RustBackend;
