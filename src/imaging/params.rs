//! Parameter types for image operations.
//!
//! These structs describe *where* an operation acts, not *how* it acts. They
//! are shared by the geometric transforms (which validate a [`Rect`] against a
//! buffer before touching it) and the neighborhood filter (which takes a
//! [`Window`]).
//!
//! ## Types
//!
//! - [`Rect`]: Axis-aligned region `(x, y, width, height)`, top-left anchored.
//! - [`Window`]: Blur half-extents; the full window is `(2dx+1) x (2dy+1)`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A rectangle anchored at its top-left corner.
///
/// A rect is valid for a `W x H` buffer iff `x + width <= W` and
/// `y + height <= H`. Zero-sized rects are valid anywhere inside those bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether this rect lies entirely inside a `width x height` area.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let right = u64::from(self.x) + u64::from(self.width);
        let bottom = u64::from(self.y) + u64::from(self.height);
        right <= u64::from(width) && bottom <= u64::from(height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Geometry-style `WxH+X+Y`.
impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Half-extents of a box-blur window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Window {
    pub dx: u32,
    pub dy: u32,
}

impl Window {
    pub fn new(dx: u32, dy: u32) -> Self {
        Self { dx, dy }
    }

    /// Number of samples in an unclipped window.
    pub fn full_area(self) -> u64 {
        (2 * u64::from(self.dx) + 1) * (2 * u64::from(self.dy) + 1)
    }
}
