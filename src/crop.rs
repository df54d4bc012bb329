//! Pointer-drag crop selection.
//!
//! The selector is a two-state machine, `Idle -> Dragging -> Idle`. It only
//! produces image-space coordinates; the resulting rectangle is handed to
//! the sort session, which owns it until commit or the next image.
//!
//! Events are expected as `press -> move* -> release`. A `move` or `release`
//! without a prior `press` is ignored, and a new `press` mid-drag replaces
//! the anchor of the unfinished drag.

use crate::geometry::ViewMapping;
use crate::types::{CropRect, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Anchor corner in image space.
    Dragging { anchor: (u32, u32) },
}

/// Tracks one crop drag gesture.
#[derive(Debug, Clone, Default)]
pub struct CropSelector {
    state: DragState,
}

impl CropSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Start a drag at `point`.
    ///
    /// `mapping` is `None` while no image is loaded, in which case the press
    /// is ignored and `false` is returned.
    pub fn press(&mut self, point: Point, mapping: Option<&ViewMapping>) -> bool {
        let Some(mapping) = mapping else {
            return false;
        };
        self.state = DragState::Dragging {
            anchor: mapping.to_image(point),
        };
        true
    }

    /// Extend the drag to `point`, returning the normalized rectangle to
    /// store and redraw. `None` when not dragging.
    pub fn drag(&mut self, point: Point, mapping: Option<&ViewMapping>) -> Option<CropRect> {
        let DragState::Dragging { anchor } = self.state else {
            return None;
        };
        let mapping = mapping?;
        Some(CropRect::from_corners(anchor, mapping.to_image(point)))
    }

    /// Finish the drag. Returns whether a drag was actually in progress.
    pub fn release(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }

    /// Abandon any drag, e.g. when the image underneath changes.
    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }
}
