//! LogSink - logs frame summary via tracing

use contracts::{ContractError, OverlaySink, RenderedFrame};
use tracing::{info, instrument};

/// Sink that logs frame summaries for debugging
pub struct LogSink {
    name: String,
    frames: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: 0,
        }
    }

    fn log_frame_summary(&self, frame: &RenderedFrame) {
        let stats = &frame.stats;
        info!(
            sink = %self.name,
            sequence = frame.sequence,
            frame_index = frame.frame_index,
            time_s = frame.time_s,
            commands = frame.commands.len(),
            heatmap_cells = stats.heatmap_cells,
            player_boxes = stats.player_boxes,
            action_boxes = stats.action_boxes,
            ball_points = stats.ball_points,
            "Overlay frame rendered"
        );
    }
}

impl OverlaySink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, frame),
        fields(sink = %self.name, frame_index = frame.frame_index)
    )]
    async fn write(&mut self, frame: &RenderedFrame) -> Result<(), ContractError> {
        self.log_frame_summary(frame);
        self.frames += 1;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, frames = self.frames, "LogSink closed");
        Ok(())
    }
}
