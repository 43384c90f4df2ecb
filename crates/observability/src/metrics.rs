//! Overlay render metrics
//!
//! Records per-pass render statistics and aggregates them for a run summary.

use contracts::RenderStats;
use metrics::{counter, gauge, histogram};

/// Record the metrics of one render pass
///
/// Called by the renderer at the end of every pass.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_render_stats;
///
/// let stats = renderer.render(&mut canvas, t, &state);
/// record_render_stats(&stats);
/// ```
pub fn record_render_stats(stats: &RenderStats) {
    if !stats.drawn {
        counter!("overlay_frames_skipped_total").increment(1);
        return;
    }

    counter!("overlay_frames_rendered_total").increment(1);
    gauge!("overlay_last_frame_index").set(stats.frame_index as f64);

    histogram!("overlay_draw_commands").record(stats.commands as f64);
    gauge!("overlay_heatmap_cells").set(stats.heatmap_cells as f64);
    gauge!("overlay_player_boxes").set(stats.player_boxes as f64);
    gauge!("overlay_action_boxes").set(stats.action_boxes as f64);
    gauge!("overlay_ball_trail_points").set(stats.ball_points as f64);

    if stats.skipped_records > 0 {
        counter!("overlay_records_skipped_total").increment(stats.skipped_records as u64);
    }
}

/// Record a rendered frame handed to a sink
pub fn record_frame_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "overlay_frames_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record wall-clock time of one render pass
pub fn record_render_latency_ms(latency_ms: f64) {
    histogram!("overlay_render_latency_ms").record(latency_ms);
}

/// Record an analysis API call
pub fn record_api_request(endpoint: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "analysis_api_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the latest analysis progress of a video
pub fn record_analysis_progress(source: &str, percent: f64) {
    gauge!("analysis_progress_percent", "source" => source.to_string()).set(percent);
}

/// Render metrics aggregator
///
/// Aggregates in memory for a run summary.
#[derive(Debug, Clone, Default)]
pub struct RenderMetricsAggregator {
    /// Passes that drew
    pub total_frames: u64,

    /// Passes skipped for an unknown video size
    pub skipped_frames: u64,

    /// Draw commands issued
    pub total_commands: u64,

    /// Records skipped for malformed coordinates
    pub skipped_records: u64,

    /// Passes that drew at least one player box
    pub frames_with_players: u64,

    /// Passes that drew at least one action box
    pub frames_with_actions: u64,

    /// Heatmap cell count per pass
    pub heatmap_stats: RunningStats,

    /// Ball trail length per pass
    pub ball_stats: RunningStats,

    /// Render time per pass (ms)
    pub latency_stats: RunningStats,
}

impl RenderMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one pass
    pub fn update(&mut self, stats: &RenderStats) {
        if !stats.drawn {
            self.skipped_frames += 1;
            return;
        }

        self.total_frames += 1;
        self.total_commands += stats.commands as u64;
        self.skipped_records += stats.skipped_records as u64;

        if stats.player_boxes > 0 {
            self.frames_with_players += 1;
        }
        if stats.action_boxes > 0 {
            self.frames_with_actions += 1;
        }

        self.heatmap_stats.push(stats.heatmap_cells as f64);
        self.ball_stats.push(stats.ball_points as f64);
    }

    pub fn record_latency_ms(&mut self, latency_ms: f64) {
        self.latency_stats.push(latency_ms);
    }

    /// Build the summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            skipped_frames: self.skipped_frames,
            total_commands: self.total_commands,
            skipped_records: self.skipped_records,
            player_coverage: percent(self.frames_with_players, self.total_frames),
            action_coverage: percent(self.frames_with_actions, self.total_frames),
            heatmap_cells: StatsSummary::from(&self.heatmap_stats),
            ball_points: StatsSummary::from(&self.ball_stats),
            render_ms: StatsSummary::from(&self.latency_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub skipped_frames: u64,
    pub total_commands: u64,
    pub skipped_records: u64,
    /// Percent of passes with player boxes
    pub player_coverage: f64,
    /// Percent of passes with action boxes
    pub action_coverage: f64,
    pub heatmap_cells: StatsSummary,
    pub ball_points: StatsSummary,
    pub render_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Render Metrics Summary ===")?;
        writeln!(f, "Rendered frames: {}", self.total_frames)?;
        if self.skipped_frames > 0 {
            writeln!(f, "Skipped frames: {}", self.skipped_frames)?;
        }
        writeln!(f, "Draw commands: {}", self.total_commands)?;
        writeln!(f, "Malformed records skipped: {}", self.skipped_records)?;
        writeln!(
            f,
            "Frames with players: {:.2}%, with actions: {:.2}%",
            self.player_coverage, self.action_coverage
        )?;
        writeln!(f, "Heatmap cells: {}", self.heatmap_cells)?;
        writeln!(f, "Ball trail points: {}", self.ball_points)?;
        writeln!(f, "Render time (ms): {}", self.render_ms)?;
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
