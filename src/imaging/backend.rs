//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the only way the sorting engine touches
//! pixels. It covers the five operations the workflow needs: decode (with
//! orientation applied), read display metadata, crop, resize for display,
//! and encode to a path.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! recording `MockBackend` in the `tests` module below.

use super::params::Quality;
use crate::types::{CropRect, Size};
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// A decoded image with EXIF orientation already applied.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub pixels: DynamicImage,
    /// Container format detected while decoding, if known.
    pub format: Option<ImageFormat>,
}

impl DecodedImage {
    pub fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }
}

/// Camera details shown next to the image.
///
/// Field mapping:
/// - `make`, `model`: EXIF `Make` / `Model`
/// - `captured_at`: EXIF `DateTimeOriginal`, verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
    pub captured_at: Option<String>,
}

impl ImageMetadata {
    /// `"Make Model"`, present only when a model is known.
    pub fn camera(&self) -> Option<String> {
        let model = self.model.as_deref()?;
        Some(match self.make.as_deref() {
            Some(make) if !make.is_empty() => format!("{make} {model}"),
            _ => model.to_string(),
        })
    }
}

/// Codec operations the sorting workflow depends on.
pub trait ImageBackend {
    /// Decode `path` and rotate/flip it according to its EXIF orientation.
    fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError>;

    /// Read embedded camera metadata. Files without EXIF yield the default.
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError>;

    /// Cut `rect` (image space) out of `image`.
    fn crop(&self, image: &DynamicImage, rect: CropRect) -> DynamicImage;

    /// Scale `image` to exactly `size`.
    fn resize(&self, image: &DynamicImage, size: Size) -> DynamicImage;

    /// Write `image` to `path` in `format`. The path's own extension is
    /// not consulted, so temporary names are fine.
    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Mock backend that records operations instead of running a codec.
    ///
    /// `decode` returns a blank image of the size registered for the file
    /// name (or 64x48), `encode` writes a small marker file so callers can
    /// observe placement on disk.
    #[derive(Default)]
    pub struct MockBackend {
        pub sizes: Mutex<HashMap<String, Size>>,
        pub metadata: Mutex<HashMap<String, ImageMetadata>>,
        pub fail_decode: Mutex<Vec<String>>,
        pub fail_encode: Mutex<bool>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Decode(String),
        ReadMetadata(String),
        Crop(CropRect),
        Resize(Size),
        Encode {
            path: PathBuf,
            format: ImageFormat,
            size: Size,
        },
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_size(self, file_name: &str, size: Size) -> Self {
            self.sizes
                .lock()
                .unwrap()
                .insert(file_name.to_string(), size);
            self
        }

        pub fn with_metadata(self, file_name: &str, metadata: ImageMetadata) -> Self {
            self.metadata
                .lock()
                .unwrap()
                .insert(file_name.to_string(), metadata);
            self
        }

        pub fn failing_decode(self, file_name: &str) -> Self {
            self.fail_decode
                .lock()
                .unwrap()
                .push(file_name.to_string());
            self
        }

        pub fn failing_encode(self) -> Self {
            *self.fail_encode.lock().unwrap() = true;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError> {
            let name = file_name(path);
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(name.clone()));
            if self.fail_decode.lock().unwrap().contains(&name) {
                return Err(BackendError::Decode {
                    path: path.display().to_string(),
                    message: "mock decode failure".into(),
                });
            }
            let size = self
                .sizes
                .lock()
                .unwrap()
                .get(&name)
                .copied()
                .unwrap_or(Size::new(64, 48));
            Ok(DecodedImage {
                pixels: DynamicImage::new_rgb8(size.width, size.height),
                format: ImageFormat::from_path(path).ok(),
            })
        }

        fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError> {
            let name = file_name(path);
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::ReadMetadata(name.clone()));
            Ok(self
                .metadata
                .lock()
                .unwrap()
                .get(&name)
                .cloned()
                .unwrap_or_default())
        }

        fn crop(&self, image: &DynamicImage, rect: CropRect) -> DynamicImage {
            self.operations.lock().unwrap().push(RecordedOp::Crop(rect));
            image.crop_imm(rect.x1, rect.y1, rect.width(), rect.height())
        }

        fn resize(&self, _image: &DynamicImage, size: Size) -> DynamicImage {
            self.operations.lock().unwrap().push(RecordedOp::Resize(size));
            DynamicImage::new_rgb8(size.width, size.height)
        }

        fn encode(
            &self,
            image: &DynamicImage,
            path: &Path,
            format: ImageFormat,
            _quality: Quality,
        ) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                path: path.to_path_buf(),
                format,
                size: Size::new(image.width(), image.height()),
            });
            if *self.fail_encode.lock().unwrap() {
                // Leave a partial file behind, as a real encoder might.
                std::fs::write(path, b"partial")?;
                return Err(BackendError::Encode {
                    path: path.display().to_string(),
                    message: "mock encode failure".into(),
                });
            }
            std::fs::write(path, format!("{}x{}", image.width(), image.height()))?;
            Ok(())
        }
    }

    #[test]
    fn mock_records_decode_with_registered_size() {
        let backend = MockBackend::new().with_size("a.jpg", Size::new(800, 600));
        let decoded = backend.decode(Path::new("/pool/a.jpg")).unwrap();
        assert_eq!(decoded.size(), Size::new(800, 600));
        assert_eq!(decoded.format, Some(ImageFormat::Jpeg));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Decode("a.jpg".into())]
        );
    }

    #[test]
    fn mock_decode_failure() {
        let backend = MockBackend::new().failing_decode("bad.png");
        assert!(matches!(
            backend.decode(Path::new("/pool/bad.png")),
            Err(BackendError::Decode { .. })
        ));
    }

    #[test]
    fn mock_crop_uses_rect_dimensions() {
        let backend = MockBackend::new();
        let img = DynamicImage::new_rgb8(100, 100);
        let out = backend.crop(&img, CropRect::from_corners((10, 20), (60, 40)));
        assert_eq!((out.width(), out.height()), (50, 20));
    }

    #[test]
    fn camera_joins_make_and_model() {
        let meta = ImageMetadata {
            make: Some("Canon".into()),
            model: Some("EOS R5".into()),
            captured_at: None,
        };
        assert_eq!(meta.camera().as_deref(), Some("Canon EOS R5"));

        let model_only = ImageMetadata {
            model: Some("X100V".into()),
            ..Default::default()
        };
        assert_eq!(model_only.camera().as_deref(), Some("X100V"));

        assert_eq!(ImageMetadata::default().camera(), None);
    }
}
