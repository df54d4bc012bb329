//! Value types shared by the viewport, crop and sorting modules.
//!
//! All coordinates here are in one of two spaces:
//!
//! - **image space**: pixels of the decoded, orientation-corrected original
//! - **viewport space**: pixels of the widget the scaled image is drawn into
//!
//! [`CropRect`] is always image space. [`Point`] is used for both; the
//! function signature tells you which.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

/// A pointer position. Viewport points can fall outside the image (or the
/// widget, while a drag leaves it), so they are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Crop rectangle in image space.
///
/// Always normalized: `x1 <= x2`, `y1 <= y2`. Construct through
/// [`CropRect::from_corners`] so the order of the drag does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl CropRect {
    /// Build a rectangle from two arbitrary corners.
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            x1: a.0.min(b.0),
            y1: a.1.min(b.1),
            x2: a.0.max(b.0),
            y2: a.1.max(b.1),
        }
    }

    /// Re-normalize the corners and pull them inside an image of `size`.
    pub fn clamped_to(&self, size: Size) -> Self {
        let clamp = |x: u32, y: u32| (x.min(size.width), y.min(size.height));
        Self::from_corners(clamp(self.x1, self.y1), clamp(self.x2, self.y2))
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// Whether both sides reach `min_side` pixels.
    ///
    /// Smaller rectangles come from a stray click rather than a real
    /// selection and are not applied on commit.
    pub fn is_usable(&self, min_side: u32) -> bool {
        self.width() >= min_side && self.height() >= min_side
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {}) [{}x{}]",
            self.x1,
            self.y1,
            self.x2,
            self.y2,
            self.width(),
            self.height()
        )
    }
}
