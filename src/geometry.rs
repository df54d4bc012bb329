//! Mapping between image pixels and the on-screen viewport.
//!
//! The current image is drawn scaled to fit the viewport (never enlarged)
//! and centered. Pointer events arrive in viewport space; crop rectangles are
//! kept in image space so they stay valid across window resizes.
//!
//! ```text
//! viewport (cw x ch)
//! ┌──────────────────────────────┐
//! │   sx                         │
//! │  ┌─────────────────────┐     │
//! │sy│ image * scale       │     │
//! │  │ (disp_w x disp_h)   │     │
//! │  └─────────────────────┘     │
//! └──────────────────────────────┘
//! ```
//!
//! A [`ViewMapping`] is a plain value recomputed on every resize and drag
//! event. Construction is pure and cheap.

use crate::types::{CropRect, Point, Size};

/// Viewports narrower or shorter than this are still being laid out by the
/// toolkit; mapping falls back to identity scale.
const MIN_VIEWPORT_SIDE: u32 = 2;

/// Scale and offset that place an image of `image` size inside a viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewMapping {
    pub image: Size,
    pub viewport: Size,
    /// Uniform scale factor, `<= 1.0`.
    pub scale: f64,
    /// Size of the drawn image, truncated to whole pixels.
    pub display: Size,
    /// Top-left corner of the drawn image in viewport space.
    pub offset_x: i64,
    pub offset_y: i64,
}

/// Scale factor that fits `image` inside `viewport` without upscaling.
///
/// Returns `1.0` while the viewport is degenerate (either side below two
/// pixels) or the image is empty.
pub fn fit_scale(image: Size, viewport: Size) -> f64 {
    if viewport.width < MIN_VIEWPORT_SIDE
        || viewport.height < MIN_VIEWPORT_SIDE
        || image.width == 0
        || image.height == 0
    {
        return 1.0;
    }
    let sx = viewport.width as f64 / image.width as f64;
    let sy = viewport.height as f64 / image.height as f64;
    let scale = sx.min(sy).min(1.0);
    if scale <= 0.0 { 1.0 } else { scale }
}

impl ViewMapping {
    pub fn new(image: Size, viewport: Size) -> Self {
        let scale = fit_scale(image, viewport);
        let display = Size::new(
            (image.width as f64 * scale) as u32,
            (image.height as f64 * scale) as u32,
        );
        // Floor division: a degenerate viewport can be smaller than the image.
        let offset_x = (viewport.width as i64 - display.width as i64).div_euclid(2);
        let offset_y = (viewport.height as i64 - display.height as i64).div_euclid(2);
        Self {
            image,
            viewport,
            scale,
            display,
            offset_x,
            offset_y,
        }
    }

    /// Map a viewport point to image pixels, clamped to `[0, W] x [0, H]`.
    pub fn to_image(&self, point: Point) -> (u32, u32) {
        let ix = (point.x as f64 - self.offset_x as f64) / self.scale;
        let iy = (point.y as f64 - self.offset_y as f64) / self.scale;
        (
            ix.clamp(0.0, self.image.width as f64) as u32,
            iy.clamp(0.0, self.image.height as f64) as u32,
        )
    }

    /// Map image pixels to a viewport position (used for the crop overlay).
    pub fn to_viewport(&self, ix: u32, iy: u32) -> (f64, f64) {
        (
            self.offset_x as f64 + ix as f64 * self.scale,
            self.offset_y as f64 + iy as f64 * self.scale,
        )
    }

    /// Crop rectangle as `(left, top, right, bottom)` in viewport space.
    pub fn rect_to_viewport(&self, rect: &CropRect) -> (f64, f64, f64, f64) {
        let (l, t) = self.to_viewport(rect.x1, rect.y1);
        let (r, b) = self.to_viewport(rect.x2, rect.y2);
        (l, t, r, b)
    }
}
