//! Overlay export orchestration.

mod orchestrator;
mod stats;

pub use orchestrator::{render_times, ExportConfig, ExportPipeline};
pub use stats::ExportStats;
