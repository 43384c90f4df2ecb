//! Overlay renderer: one pass per playback instant.

use std::collections::HashMap;

use contracts::{
    AnalysisResults, Canvas, JerseyMapping, OverlayConfig, OverlayVisibility, PlayerDetection,
    Point, RecordingCanvas, RenderStats, RenderedFrame, TrackId, VideoSize,
};
use tracing::{debug, instrument};

use crate::ball_trail::{BallTrail, RejectReason};
use crate::boxes::{draw_action_boxes, draw_player_boxes};
use crate::frame_lookup::current_frame;
use crate::heatmap::Heatmap;
use crate::hit_test::hit_test_player;
use crate::jersey::JerseyResolver;

/// Caller-owned view state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    pub visibility: OverlayVisibility,
    /// Player drawn highlighted
    pub selected_player: Option<TrackId>,
    /// Restrict the heatmap to one track
    pub heatmap_player: Option<TrackId>,
}

impl OverlayState {
    pub fn new(visibility: OverlayVisibility) -> Self {
        Self {
            visibility,
            ..Default::default()
        }
    }
}

/// Draws the analysis overlays for any playback time
///
/// Borrows the loaded results; the detection arrays are never modified.
#[derive(Debug)]
pub struct OverlayRenderer<'a> {
    results: &'a AnalysisResults,
    config: OverlayConfig,
    fps: f64,
    size: VideoSize,
    jerseys: JerseyResolver,
    ball_trail: BallTrail,
}

impl<'a> OverlayRenderer<'a> {
    /// Prepare a renderer; filters the ball trajectory once
    pub fn new(results: &'a AnalysisResults, config: OverlayConfig) -> Self {
        let fps = contracts::sanitize_fps(results.video_info.fps, config.default_fps);
        let ball_trail = BallTrail::build(results.ball_trajectory(), fps, &config.ball);

        let rejected = ball_trail.rejected();
        for (reason, count) in [
            (RejectReason::Unpositioned, rejected.unpositioned),
            (RejectReason::LowConfidence, rejected.low_confidence),
            (RejectReason::Jump, rejected.jump),
            (RejectReason::Velocity, rejected.velocity),
        ] {
            if count > 0 {
                metrics::counter!("overlay_ball_points_rejected_total", "reason" => reason.as_str())
                    .increment(count as u64);
            }
        }
        debug!(
            accepted = ball_trail.points().len(),
            rejected = rejected.total(),
            fps,
            "ball trail filtered"
        );

        Self {
            results,
            config,
            fps,
            size: results.video_info.size(),
            jerseys: JerseyResolver::from_tracks(results.player_tracks()),
            ball_trail,
        }
    }

    /// Rebuild jersey resolution with confirmed mappings and custom names
    pub fn with_jersey_mappings(
        mut self,
        mappings: &HashMap<TrackId, JerseyMapping>,
        custom_names: HashMap<TrackId, String>,
    ) -> Self {
        self.jerseys = JerseyResolver::new(self.results.player_tracks(), mappings, custom_names);
        self
    }

    pub fn results(&self) -> &'a AnalysisResults {
        self.results
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Frame rate in use (after the invalid-fps fallback)
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Source resolution; every canvas is sized to it
    pub fn size(&self) -> VideoSize {
        self.size
    }

    pub fn jerseys(&self) -> &JerseyResolver {
        &self.jerseys
    }

    pub fn jerseys_mut(&mut self) -> &mut JerseyResolver {
        &mut self.jerseys
    }

    pub fn ball_trail(&self) -> &BallTrail {
        &self.ball_trail
    }

    pub fn current_frame(&self, time: f64) -> u64 {
        current_frame(time, self.fps, self.config.default_fps)
    }

    /// Draw every enabled overlay for `time`
    ///
    /// Skipped entirely when the video size is unknown. Otherwise the
    /// canvas is resized to the source resolution if needed and cleared
    /// before drawing, so repeated passes never accumulate. Layers paint
    /// back to front: heatmap, player boxes, action boxes, ball trail.
    #[instrument(
        level = "trace",
        name = "overlay_render",
        skip(self, canvas, state),
        fields(frame = tracing::field::Empty)
    )]
    pub fn render<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        time: f64,
        state: &OverlayState,
    ) -> RenderStats {
        let frame = self.current_frame(time);
        tracing::Span::current().record("frame", frame);

        if !self.size.is_valid() {
            debug!(frame, "video size unknown, render skipped");
            return RenderStats::skipped(frame);
        }

        if canvas.size() != self.size {
            canvas.resize(self.size);
        }
        canvas.clear();

        let mut counter = CommandCounter::new(canvas);
        let mut stats = RenderStats {
            frame_index: frame,
            drawn: true,
            ..Default::default()
        };
        let tolerance = self.config.frame_tolerance;
        let visibility = &state.visibility;

        if visibility.heatmap {
            let heatmap = Heatmap::accumulate(
                self.results.player_tracks(),
                frame,
                self.fps,
                state.heatmap_player,
                &self.config.heatmap,
            );
            heatmap.draw(&mut counter);
            stats.heatmap_cells = heatmap.cells().len();
            stats.skipped_records += heatmap.skipped();
        }

        if visibility.player_boxes {
            let counts = draw_player_boxes(
                &mut counter,
                self.results.player_tracks(),
                frame,
                tolerance,
                &self.jerseys,
                state.selected_player,
                &self.config.boxes,
            );
            stats.player_boxes = counts.drawn;
            stats.skipped_records += counts.skipped;
        }

        if visibility.action_boxes {
            let counts =
                draw_action_boxes(&mut counter, self.results.actions(), frame, tolerance, &self.jerseys);
            stats.action_boxes = counts.drawn;
            stats.skipped_records += counts.skipped;
        }

        if visibility.ball_trail {
            stats.ball_points =
                self.ball_trail
                    .draw(&mut counter, frame, self.fps, tolerance, &self.config.ball);
        }

        stats.commands = counter.count;
        observability::record_render_stats(&stats);
        stats
    }

    /// Render into a fresh command list
    pub fn render_frame(&self, sequence: u64, time: f64, state: &OverlayState) -> RenderedFrame {
        let mut canvas = RecordingCanvas::new(self.size);
        let stats = self.render(&mut canvas, time, state);
        RenderedFrame {
            sequence,
            time_s: time,
            frame_index: stats.frame_index,
            size: self.size,
            commands: canvas.take_commands(),
            stats,
        }
    }

    /// Player whose box contains `point` (source pixels) at `time`
    pub fn player_at(&self, time: f64, point: Point) -> Option<&'a PlayerDetection> {
        hit_test_player(
            self.results.player_tracks(),
            self.current_frame(time),
            self.config.frame_tolerance,
            point,
        )
    }
}

/// Canvas adaptor counting the commands passed through
struct CommandCounter<'c, C: Canvas + ?Sized> {
    inner: &'c mut C,
    count: usize,
}

impl<'c, C: Canvas + ?Sized> CommandCounter<'c, C> {
    fn new(inner: &'c mut C) -> Self {
        Self { inner, count: 0 }
    }
}

impl<C: Canvas + ?Sized> Canvas for CommandCounter<'_, C> {
    fn size(&self) -> VideoSize {
        self.inner.size()
    }

    fn resize(&mut self, size: VideoSize) {
        self.inner.resize(size);
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn draw(&mut self, command: &contracts::DrawCommand) {
        self.count += 1;
        self.inner.draw(command);
    }
}
