//! Viewport geometry: pointer samples and normalized selection rectangles.
//!
//! All values are CSS pixels relative to the visible window. Nothing here
//! knows about scroll offsets; those are folded in by the capture step.

use serde::{Deserialize, Serialize};

/// A pointer position sampled from an input event
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPoint {
    pub x: f64,
    pub y: f64,
}

impl PointerPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for PointerPoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// The selection overlay geometry.
///
/// `left`/`top` are always the minimum corner and `width`/`height` are never
/// negative. A rectangle is only ever produced by [`normalize_rect`] or
/// [`SelectionRect::hidden`]; it is recomputed, never patched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub visible: bool,
}

impl SelectionRect {
    /// The overlay in its hidden state
    pub const fn hidden() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            visible: false,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// True when the rectangle covers no pixels and must not be captured
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Inclusive containment test (edges count as inside)
    pub fn contains(&self, p: PointerPoint) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// Build the visible rectangle spanned by a drag anchor and the current pointer.
///
/// Works for every drag direction and does not depend on any previously
/// computed rectangle, so repeated calls over a long drag cannot drift.
pub fn normalize_rect(anchor: PointerPoint, current: PointerPoint) -> SelectionRect {
    SelectionRect {
        left: anchor.x.min(current.x),
        top: anchor.y.min(current.y),
        width: (current.x - anchor.x).abs(),
        height: (current.y - anchor.y).abs(),
        visible: true,
    }
}
