//! Display ↔ source coordinate mapping.
//!
//! Canvases are sized to the source video, so drawing never scales. Input
//! events arrive in display space (the element as laid out on screen) and
//! are mapped back here.

use contracts::{Point, VideoSize};

/// Scale between a displayed element and the source video
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    scale_x: f64,
    scale_y: f64,
}

impl DisplayMapping {
    /// Mapping for a `display_width × display_height` element showing `source`
    ///
    /// Returns `None` when either size is degenerate.
    pub fn new(source: VideoSize, display_width: f64, display_height: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !source.is_valid() || !valid(display_width) || !valid(display_height) {
            return None;
        }
        Some(Self {
            scale_x: f64::from(source.width) / display_width,
            scale_y: f64::from(source.height) / display_height,
        })
    }

    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x, self.scale_y)
    }

    /// Display-space point (relative to the element's top-left) to source pixels
    pub fn to_source(&self, display: Point) -> Point {
        Point::new(display.x * self.scale_x, display.y * self.scale_y)
    }

    /// Source pixels to display space
    pub fn to_display(&self, source: Point) -> Point {
        Point::new(source.x / self.scale_x, source.y / self.scale_y)
    }
}
