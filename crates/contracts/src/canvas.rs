//! Canvas - the drawing seam between overlays and pixels.
//!
//! Overlays never touch pixels directly: they emit [`DrawCommand`]s onto a
//! [`Canvas`]. [`RecordingCanvas`] keeps the commands (tests, JSON export),
//! raster canvases in other crates paint them.

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, VideoSize};

/// Point in source pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Colour with straight (non-premultiplied) alpha in 0-1
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same colour with a different alpha, clamped into 0-1
    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: if a.is_finite() { a.clamp(0.0, 1.0) } else { 0.0 },
            ..self
        }
    }

    /// Parse `#rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::opaque(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Colour stop of a radial gradient, `offset` in 0-1 from the centre
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgba,
}

impl GradientStop {
    pub const fn new(offset: f64, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// One drawing primitive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    /// Rectangle outline
    StrokeRect {
        rect: BoundingBox,
        color: Rgba,
        line_width: f64,
    },
    /// Filled rectangle
    FillRect { rect: BoundingBox, color: Rgba },
    /// Straight segment
    Line {
        from: Point,
        to: Point,
        color: Rgba,
        line_width: f64,
    },
    /// Filled disc
    FillCircle {
        center: Point,
        radius: f64,
        color: Rgba,
    },
    /// Disc filled with a radial gradient
    RadialGradient {
        center: Point,
        radius: f64,
        stops: Vec<GradientStop>,
    },
    /// Text label with its bottom-left corner at `anchor`
    Label {
        anchor: Point,
        text: String,
        color: Rgba,
        background: Rgba,
    },
}

impl DrawCommand {
    /// Short name for logging/metrics
    pub fn kind(&self) -> &'static str {
        match self {
            DrawCommand::StrokeRect { .. } => "stroke_rect",
            DrawCommand::FillRect { .. } => "fill_rect",
            DrawCommand::Line { .. } => "line",
            DrawCommand::FillCircle { .. } => "fill_circle",
            DrawCommand::RadialGradient { .. } => "radial_gradient",
            DrawCommand::Label { .. } => "label",
        }
    }
}

/// 2D drawing context of one overlay surface
///
/// The backing store is sized in source pixels; display scaling is the
/// presenter's concern.
pub trait Canvas {
    /// Current backing-store size
    fn size(&self) -> VideoSize;

    /// Resize the backing store (discards content)
    fn resize(&mut self, size: VideoSize);

    /// Clear every pixel to transparent
    fn clear(&mut self);

    /// Draw one primitive
    fn draw(&mut self, command: &DrawCommand);
}

/// Canvas that records the commands it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    size: VideoSize,
    commands: Vec<DrawCommand>,
    clear_count: u64,
    resize_count: u64,
}

impl RecordingCanvas {
    pub fn new(size: VideoSize) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Commands drawn since the last clear
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the canvas empty
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_count(&self) -> u64 {
        self.clear_count
    }

    pub fn resize_count(&self) -> u64 {
        self.resize_count
    }

    /// Recorded commands of one kind
    pub fn count_kind(&self, kind: &str) -> usize {
        self.commands.iter().filter(|c| c.kind() == kind).count()
    }
}

impl Canvas for RecordingCanvas {
    fn size(&self) -> VideoSize {
        self.size
    }

    fn resize(&mut self, size: VideoSize) {
        self.size = size;
        self.commands.clear();
        self.resize_count += 1;
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.clear_count += 1;
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.commands.push(command.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgba::from_hex("#ef4444"), Some(Rgba::opaque(0xef, 0x44, 0x44)));
        assert_eq!(Rgba::from_hex("3b82f6"), Some(Rgba::opaque(0x3b, 0x82, 0xf6)));
        assert_eq!(Rgba::from_hex("#fff"), None);
        assert_eq!(Rgba::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_with_alpha_clamps() {
        assert_eq!(Rgba::WHITE.with_alpha(1.7).a, 1.0);
        assert_eq!(Rgba::WHITE.with_alpha(f64::NAN).a, 0.0);
    }

    #[test]
    fn test_recording_canvas_clear() {
        let mut canvas = RecordingCanvas::new(VideoSize::new(10, 10));
        canvas.draw(&DrawCommand::FillCircle {
            center: Point::new(1.0, 1.0),
            radius: 2.0,
            color: Rgba::WHITE,
        });
        assert_eq!(canvas.commands().len(), 1);
        canvas.clear();
        assert!(canvas.commands().is_empty());
        assert_eq!(canvas.clear_count(), 1);
    }

    #[test]
    fn test_command_json_tag() {
        let cmd = DrawCommand::Line {
            from: Point::new(0.0, 0.0),
            to: Point::new(1.0, 1.0),
            color: Rgba::WHITE,
            line_width: 2.0,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"kind\":\"line\""));
    }
}
