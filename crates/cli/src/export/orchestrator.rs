//! Export orchestrator - renders a time range and fans frames out to sinks.

use std::time::Instant;

use anyhow::{Context, Result};
use contracts::SinkConfig;
use dispatcher::{Dispatcher, DispatcherError};
use observability::RenderMetricsAggregator;
use overlay_engine::{OverlayRenderer, OverlayState};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::ExportStats;
use crate::error::CliError;

/// Export configuration
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Sink configurations
    pub sinks: Vec<SinkConfig>,

    /// Channel buffer size between renderer and dispatcher
    pub buffer_size: usize,
}

/// Renders overlay frames and hands them to the dispatcher
pub struct ExportPipeline {
    config: ExportConfig,
}

impl ExportPipeline {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Render every time in `times` (seconds) and wait for the sinks to drain
    pub async fn run(
        &self,
        renderer: &OverlayRenderer<'_>,
        times: &[f64],
        state: &OverlayState,
    ) -> Result<ExportStats> {
        let start_time = Instant::now();
        let (frame_tx, frame_rx) = mpsc::channel(self.config.buffer_size.max(1));

        let dispatcher = Dispatcher::from_configs(&self.config.sinks, frame_rx)
            .context("Failed to create sinks")?;
        let dispatcher_handle = dispatcher.spawn();

        info!(
            frames = times.len(),
            sinks = self.config.sinks.len(),
            "Rendering overlay frames"
        );

        let mut render_metrics = RenderMetricsAggregator::new();
        for (sequence, &time) in times.iter().enumerate() {
            let started = Instant::now();
            let frame = renderer.render_frame(sequence as u64, time, state);
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            render_metrics.update(&frame.stats);
            render_metrics.record_latency_ms(latency_ms);
            observability::record_render_latency_ms(latency_ms);

            debug!(
                sequence,
                frame_index = frame.frame_index,
                commands = frame.commands.len(),
                "Frame rendered"
            );

            frame_tx
                .send(frame)
                .await
                .map_err(|_| DispatcherError::InputClosed)?;
        }
        drop(frame_tx);

        let sinks = dispatcher_handle
            .await
            .context("Dispatcher task failed")?;

        Ok(ExportStats {
            frames_rendered: times.len() as u64,
            duration: start_time.elapsed(),
            sinks,
            render_metrics,
        })
    }
}

/// Playback times to render
///
/// A single `at` wins; otherwise `from..=to` stepped at `fps_out`. `to`
/// defaults to `duration_s`, `fps_out` to the video frame rate.
pub fn render_times(
    at: Option<f64>,
    from: f64,
    to: Option<f64>,
    fps_out: Option<f64>,
    video_fps: f64,
    duration_s: f64,
) -> Result<Vec<f64>, CliError> {
    if let Some(at) = at {
        if !at.is_finite() || at < 0.0 {
            return Err(CliError::invalid_time_range(format!("--at {at} must be >= 0")));
        }
        return Ok(vec![at]);
    }

    let step_fps = fps_out.unwrap_or(video_fps);
    if !step_fps.is_finite() || step_fps <= 0.0 {
        return Err(CliError::invalid_time_range(format!(
            "output frame rate {step_fps} must be > 0"
        )));
    }

    let end = to.unwrap_or(duration_s);
    if !from.is_finite() || !end.is_finite() || from < 0.0 || end < from {
        return Err(CliError::invalid_time_range(format!(
            "need 0 <= from ({from}) <= to ({end})"
        )));
    }

    // Small epsilon keeps an exact `to` inside the range
    let count = ((end - from) * step_fps + 1e-9).floor() as u64 + 1;
    Ok((0..count).map(|i| from + i as f64 / step_fps).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    use contracts::{
        AnalysisResults, OverflowPolicy, OverlayConfig, OverlayVisibility, SinkType,
    };

    const CLIP: &str = r#"{
        "video_info": {"width": 160, "height": 90, "fps": 10, "duration": 3},
        "players_tracking": [
            {"frame": 0, "players": [{"id": 1, "bbox": [10, 10, 40, 60], "jersey_number": 4}]},
            {"frame": 20, "players": [{"id": 1, "bbox": [30, 10, 60, 60], "jersey_number": 4}]}
        ],
        "ball_tracking": {"trajectory": [
            {"frame": 0, "center": [80, 40], "confidence": 0.9},
            {"frame": 10, "center": [90, 45], "confidence": 0.9}
        ]}
    }"#;

    /// Export `times` through a single PNG sink with a tiny queue
    async fn export_png(times: &[f64], dir: &Path) -> ExportStats {
        let results: AnalysisResults = serde_json::from_str(CLIP).unwrap();
        let renderer = OverlayRenderer::new(&results, OverlayConfig::default());
        let state = OverlayState::new(OverlayVisibility::all());
        let pipeline = ExportPipeline::new(ExportConfig {
            sinks: vec![SinkConfig {
                name: "frames".to_string(),
                sink_type: SinkType::Png,
                queue_capacity: 2,
                overflow: OverflowPolicy::Block,
                params: HashMap::from([("path".to_string(), dir.display().to_string())]),
            }],
            buffer_size: 4,
        });
        pipeline.run(&renderer, times, &state).await.unwrap()
    }

    fn png_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "png"))
            .count()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_export_writes_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let times = render_times(None, 0.0, None, None, 10.0, 3.0).unwrap();
        assert_eq!(times.len(), 31);

        let stats = export_png(&times, dir.path()).await;
        assert_eq!(stats.frames_rendered, 31);
        assert_eq!(stats.frames_dropped(), 0);
        assert_eq!(stats.sinks[0].1.write_count, 31);
        assert_eq!(png_count(dir.path()), 31);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_output_faster_than_source_keeps_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let times = render_times(None, 0.0, Some(1.0), Some(60.0), 10.0, 3.0).unwrap();
        assert_eq!(times.len(), 61);

        let stats = export_png(&times, dir.path()).await;
        assert_eq!(stats.frames_dropped(), 0);
        assert_eq!(png_count(dir.path()), 61);
    }

    #[test]
    fn test_single_time() {
        assert_eq!(render_times(Some(2.5), 0.0, None, None, 30.0, 10.0).unwrap(), vec![2.5]);
        assert!(render_times(Some(-1.0), 0.0, None, None, 30.0, 10.0).is_err());
    }

    #[test]
    fn test_range_includes_end() {
        let times = render_times(None, 1.0, Some(2.0), Some(4.0), 30.0, 10.0).unwrap();
        assert_eq!(times, vec![1.0, 1.25, 1.5, 1.75, 2.0]);
    }

    #[test]
    fn test_range_defaults_to_duration_and_video_fps() {
        let times = render_times(None, 0.0, None, None, 10.0, 1.0).unwrap();
        assert_eq!(times.len(), 11);
        assert!((times[10] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bad_ranges() {
        assert!(render_times(None, 3.0, Some(2.0), None, 30.0, 10.0).is_err());
        assert!(render_times(None, 0.0, Some(2.0), Some(0.0), 30.0, 10.0).is_err());
        assert!(render_times(None, f64::NAN, Some(2.0), None, 30.0, 10.0).is_err());
    }
}
