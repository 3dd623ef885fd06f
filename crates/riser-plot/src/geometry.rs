//! Plan-view geometry for shaft cross-sections.

use crate::PlotError;

/// Plan dimensions of a rectangular shaft, metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaftDims {
    pub width: f64,
    pub depth: f64,
}

impl ShaftDims {
    /// Derive plan dimensions from a required area `A` and a width:depth
    /// aspect ratio `r`: `width = sqrt(r * A)`, `depth = width / r`.
    pub fn from_area(area: f64, aspect_ratio: f64) -> Result<Self, PlotError> {
        if !(area.is_finite() && area > 0.0 && aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return Err(PlotError::InvalidDimensions { area, aspect_ratio });
        }
        let width = (aspect_ratio * area).sqrt();
        Ok(Self {
            width,
            depth: width / aspect_ratio,
        })
    }

    pub fn area(&self) -> f64 {
        self.width * self.depth
    }

    /// Whitespace kept around the outline when plotting.
    pub fn margin(&self) -> f64 {
        0.1 * self.width
    }
}

/// Axis-aligned rectangle in plan coordinates, origin at the bottom-left
/// corner, y pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Build from an anchor corner and signed extents. Negative extents
    /// grow left/down from the anchor, which is how the corner placement
    /// rules are naturally written.
    pub fn from_anchor(x: f64, y: f64, dx: f64, dy: f64) -> Self {
        let (x, width) = if dx < 0.0 { (x + dx, -dx) } else { (x, dx) };
        let (y, height) = if dy < 0.0 { (y + dy, -dy) } else { (y, dy) };
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }
}
