//! Shared test utilities.
//!
//! Fixture builders for projects on disk and small synthetic images.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (_tmp, project) = new_project(&["cats", "dogs"]);
//! touch_pool(&project, &["a.jpg", "b.png"]);
//! assert_eq!(dir_listing(&project.unsorted_dir()), ["a.jpg", "b.png"]);
//! ```

use image::{ImageEncoder, RgbImage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::project::{self, Project};

// =========================================================================
// Project fixtures
// =========================================================================

/// Create a project called `test` with `classes` inside a fresh temp dir.
///
/// Keep the returned `TempDir` alive for as long as the project is used.
pub fn new_project<S: AsRef<str>>(classes: &[S]) -> (TempDir, Project) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("test");
    let project = project::create(&root, "test", classes).unwrap();
    (tmp, project)
}

/// Put placeholder files into `unsorted`. Contents are not valid images;
/// use these with the mock backend.
pub fn touch_pool(project: &Project, names: &[&str]) {
    let dir = project.unsorted_dir();
    fs::create_dir_all(&dir).unwrap();
    for name in names {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }
}

/// Sorted file names in `dir`, or empty if it does not exist.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =========================================================================
// Synthetic images
// =========================================================================

/// Gradient that differs along both axes, so crops and rotations are
/// detectable by sampling pixels.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}
