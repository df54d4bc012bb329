//! Pure Rust codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, BMP, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Orientation | `rexif` Orientation tag → `rotate90`/`fliph`/… |
//! | Camera metadata | `rexif` `Make`, `Model`, `DateTimeOriginal` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize (display) | `DynamicImage::resize_exact`, `Triangle` filter |
//! | Encode | `JpegEncoder` with quality, `write_to` for lossless formats |

use super::backend::{BackendError, DecodedImage, ImageBackend, ImageMetadata};
use super::params::Quality;
use crate::types::{CropRect, Size};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

/// Codec backend built on the `image` and `rexif` crates.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_exif_quiet(data: &[u8]) -> Option<rexif::ExifData> {
    rexif::parse_buffer_quiet(data).0.ok()
}

/// Numeric EXIF orientation (1–8) from a tag value of any integer type.
fn orientation_from_tag_value(value: &rexif::TagValue) -> Option<u16> {
    let raw = match value {
        rexif::TagValue::U16(vals) => vals.first().copied(),
        rexif::TagValue::U8(vals) => vals.first().map(|&v| v as u16),
        rexif::TagValue::U32(vals) => vals.first().and_then(|v| u16::try_from(*v).ok()),
        rexif::TagValue::I16(vals) => vals.first().and_then(|v| u16::try_from(*v).ok()),
        rexif::TagValue::I32(vals) => vals.first().and_then(|v| u16::try_from(*v).ok()),
        _ => None,
    }?;
    (1..=8).contains(&raw).then_some(raw)
}

fn exif_orientation(exif: &rexif::ExifData) -> Option<u16> {
    exif.entries
        .iter()
        .find(|entry| entry.tag == rexif::ExifTag::Orientation)
        .and_then(|entry| orientation_from_tag_value(&entry.value))
}

/// Rotate/flip `img` so that orientation `code` displays upright.
fn apply_orientation(img: DynamicImage, code: u16) -> DynamicImage {
    match code {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

fn ascii_tag(exif: &rexif::ExifData, tag: rexif::ExifTag) -> Option<String> {
    exif.entries
        .iter()
        .find(|entry| entry.tag == tag)
        .and_then(|entry| match &entry.value {
            rexif::TagValue::Ascii(s) => {
                let s = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
                (!s.is_empty()).then(|| s.to_string())
            }
            _ => None,
        })
}

/// JPEG has no alpha channel and only 8-bit gray/RGB encoders.
fn jpeg_compatible(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image.clone(),
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLuma16(_) => {
            DynamicImage::ImageLuma8(image.to_luma8())
        }
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

/// The lossless WebP encoder accepts 8-bit RGB(A) only.
fn webp_compatible(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image.clone(),
        _ if image.color().has_alpha() => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError> {
        let data = fs::read(path)?;
        let decode_err = |message: String| BackendError::Decode {
            path: path.display().to_string(),
            message,
        };
        let reader = ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()
            .map_err(|e| decode_err(e.to_string()))?;
        let format = reader.format();
        let pixels = reader.decode().map_err(|e| decode_err(e.to_string()))?;

        let orientation = parse_exif_quiet(&data)
            .as_ref()
            .and_then(exif_orientation)
            .unwrap_or(1);
        if orientation != 1 {
            log::debug!("applying EXIF orientation {orientation} to {}", path.display());
        }

        Ok(DecodedImage {
            pixels: apply_orientation(pixels, orientation),
            format,
        })
    }

    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError> {
        let data = fs::read(path)?;
        let Some(exif) = parse_exif_quiet(&data) else {
            return Ok(ImageMetadata::default());
        };
        Ok(ImageMetadata {
            make: ascii_tag(&exif, rexif::ExifTag::Make),
            model: ascii_tag(&exif, rexif::ExifTag::Model),
            captured_at: ascii_tag(&exif, rexif::ExifTag::DateTimeOriginal),
        })
    }

    fn crop(&self, image: &DynamicImage, rect: CropRect) -> DynamicImage {
        image.crop_imm(rect.x1, rect.y1, rect.width(), rect.height())
    }

    fn resize(&self, image: &DynamicImage, size: Size) -> DynamicImage {
        image.resize_exact(size.width, size.height, FilterType::Triangle)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<(), BackendError> {
        if !matches!(
            format,
            ImageFormat::Jpeg
                | ImageFormat::WebP
                | ImageFormat::Png
                | ImageFormat::Bmp
                | ImageFormat::Tiff
        ) {
            return Err(BackendError::UnsupportedFormat(format!("{format:?}")));
        }
        let encode_err = |e: image::ImageError| BackendError::Encode {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);

        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut writer, quality.value());
                jpeg_compatible(image)
                    .write_with_encoder(encoder)
                    .map_err(encode_err)?;
            }
            ImageFormat::WebP => {
                webp_compatible(image)
                    .write_to(&mut writer, format)
                    .map_err(encode_err)?;
            }
            _ => {
                image.write_to(&mut writer, format).map_err(encode_err)?;
            }
        }

        writer.flush()?;
        // Data must be on disk before the caller renames the file into place.
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}
