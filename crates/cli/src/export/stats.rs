//! Export statistics.

use std::time::Duration;

use dispatcher::DispatchReport;
use observability::RenderMetricsAggregator;

/// Statistics from an export run
#[derive(Debug, Clone, Default)]
pub struct ExportStats {
    /// Frames handed to the dispatcher
    pub frames_rendered: u64,

    /// Wall time of the run
    pub duration: Duration,

    /// Per-sink metrics at shutdown
    pub sinks: DispatchReport,

    /// Render pass aggregates
    pub render_metrics: RenderMetricsAggregator,
}

impl ExportStats {
    /// Frames rendered per second of wall time
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_rendered as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Frames dropped across all sinks
    pub fn frames_dropped(&self) -> u64 {
        self.sinks.iter().map(|(_, s)| s.dropped_count).sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Export Statistics ===\n");
        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Frames rendered: {}", self.frames_rendered);
        println!("  Render rate: {:.2} frames/s", self.fps());
        println!("  Frames dropped: {}", self.frames_dropped());

        if !self.sinks.is_empty() {
            println!("\nSinks");
            for (name, snapshot) in &self.sinks {
                println!("  {name}: {snapshot}");
            }
        }

        println!("\n{}", self.render_metrics.summary());
    }
}
