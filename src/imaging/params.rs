//! Parameter types for encode operations.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`ACCEPTED_EXTENSIONS`]: the image extensions the pool recognizes.
//! - [`format_for_extension`]: extension → encoder format, used on commit so
//!   an image keeps its container type.

use image::ImageFormat;

/// Quality setting for lossy image encoding (1-100).
///
/// Only JPEG output consults it; the other accepted formats are lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Extensions (lowercase, no dot) accepted into the pool.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp", "tif", "tiff"];

/// Whether `ext` (any casing, no dot) is an accepted image extension.
pub fn is_accepted_extension(ext: &str) -> bool {
    ACCEPTED_EXTENSIONS
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(ext))
}

/// Encoder format for an extension (any casing, with or without the dot).
pub fn format_for_extension(ext: &str) -> Option<ImageFormat> {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "png" => Some(ImageFormat::Png),
        "bmp" => Some(ImageFormat::Bmp),
        "webp" => Some(ImageFormat::WebP),
        "tif" | "tiff" => Some(ImageFormat::Tiff),
        _ => None,
    }
}
