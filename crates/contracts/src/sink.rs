//! OverlaySink trait - Dispatcher output interface
//!
//! Defines the rendered-frame envelope and the abstract interface for sinks.

use serde::{Deserialize, Serialize};

use crate::{ContractError, DrawCommand, VideoSize};

/// Overlay drawing for one playback instant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedFrame {
    /// Output sequence number (monotonically increasing)
    pub sequence: u64,

    /// Playback time (seconds)
    pub time_s: f64,

    /// Source frame index at `time_s`
    pub frame_index: u64,

    /// Canvas size (source resolution)
    pub size: VideoSize,

    /// Commands drawn after the clear, in paint order
    pub commands: Vec<DrawCommand>,

    /// What the render pass drew
    #[serde(default)]
    pub stats: RenderStats,
}

/// Per-pass render statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Frame index the pass resolved playback time to
    pub frame_index: u64,
    /// False when the pass was skipped (unknown video size)
    pub drawn: bool,
    pub heatmap_cells: usize,
    pub player_boxes: usize,
    pub action_boxes: usize,
    /// Accepted trail points inside the trailing window
    pub ball_points: usize,
    /// Records skipped for malformed coordinates
    pub skipped_records: usize,
    /// Total draw commands issued
    pub commands: usize,
}

impl RenderStats {
    /// Stats of a pass that drew nothing
    pub fn skipped(frame_index: u64) -> Self {
        Self {
            frame_index,
            ..Default::default()
        }
    }
}

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(OverlaySink: Send)]
pub trait LocalOverlaySink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write a rendered frame
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, frame: &RenderedFrame) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
