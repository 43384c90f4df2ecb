//! Sink implementations
//!
//! Contains LogSink, PngSink, and JsonSink.

mod json;
mod log;
mod png;

pub use self::json::JsonSink;
pub use self::log::LogSink;
pub use self::png::PngSink;

use std::collections::HashMap;
use std::path::PathBuf;

/// Required `path` param of file-backed sinks
fn path_param(params: &HashMap<String, String>) -> std::io::Result<PathBuf> {
    params
        .get("path")
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' param"))
}

#[cfg(test)]
pub(crate) fn test_frame(sequence: u64) -> contracts::RenderedFrame {
    use contracts::{BoundingBox, DrawCommand, RenderStats, Rgba, VideoSize};

    contracts::RenderedFrame {
        sequence,
        time_s: sequence as f64 / 30.0,
        frame_index: sequence,
        size: VideoSize::new(32, 24),
        commands: vec![DrawCommand::StrokeRect {
            rect: BoundingBox::new(4.0, 4.0, 20.0, 16.0),
            color: Rgba::opaque(0x34, 0xd3, 0x99),
            line_width: 2.0,
        }],
        stats: RenderStats {
            frame_index: sequence,
            drawn: true,
            player_boxes: 1,
            commands: 1,
            ..Default::default()
        },
    }
}
