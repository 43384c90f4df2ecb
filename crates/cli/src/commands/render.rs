//! `render` command implementation.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::{OverflowPolicy, OverlayVisibility, SinkConfig, SinkType};
use overlay_engine::{OverlayRenderer, OverlayState};
use tracing::{info, warn};

use super::{load_config, load_results, shutdown_signal};
use crate::cli::RenderArgs;
use crate::export::{render_times, ExportConfig, ExportPipeline};

/// Sink added by `--out`
const CLI_PNG_SINK: &str = "cli_png";

/// Execute the `render` command
pub async fn run_render(args: &RenderArgs) -> Result<()> {
    let config = load_config(&args.api)?;
    let loaded = load_results(&args.source, args.jerseys.as_deref(), &config).await?;

    let renderer = OverlayRenderer::new(&loaded.results, config.overlay.clone())
        .with_jersey_mappings(&loaded.mappings, HashMap::new());
    if !renderer.size().is_valid() {
        warn!("Video size unknown - frames will be empty");
    }

    let video_info = &loaded.results.video_info;
    let duration_s = video_info.effective_total_frames() as f64 / renderer.fps();
    let times = render_times(
        args.at,
        args.from,
        args.to,
        args.fps_out,
        renderer.fps(),
        duration_s,
    )?;

    let state = OverlayState {
        visibility: visibility(args, config.visibility),
        selected_player: args.player,
        heatmap_player: args.heatmap_player,
    };
    if !state.visibility.any() {
        warn!("All overlays hidden - frames will be empty");
    }

    let sinks = sink_configs(config.sinks.clone(), args.out.as_deref());
    info!(
        frames = times.len(),
        fps = renderer.fps(),
        sinks = sinks.len(),
        visibility = ?state.visibility,
        "Render configured"
    );

    let pipeline = ExportPipeline::new(ExportConfig {
        sinks,
        buffer_size: args.buffer_size,
    });

    tokio::select! {
        result = pipeline.run(&renderer, &times, &state) => {
            let stats = result.context("Overlay export failed")?;
            info!(
                frames = stats.frames_rendered,
                dropped = stats.frames_dropped(),
                duration_secs = stats.duration.as_secs_f64(),
                "Export completed"
            );
            stats.print_summary();
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping render...");
        }
    }

    Ok(())
}

/// Configured visibility with the CLI toggles applied
fn visibility(args: &RenderArgs, base: OverlayVisibility) -> OverlayVisibility {
    let mut visibility = base;
    if args.heatmap {
        visibility.heatmap = true;
    }
    if args.no_heatmap {
        visibility.heatmap = false;
    }
    if args.no_boxes {
        visibility.player_boxes = false;
    }
    if args.no_actions {
        visibility.action_boxes = false;
    }
    if args.no_ball {
        visibility.ball_trail = false;
    }
    visibility
}

/// Configured sinks plus a PNG sink for `--out`; a log sink when nothing is configured
fn sink_configs(mut sinks: Vec<SinkConfig>, out: Option<&Path>) -> Vec<SinkConfig> {
    if let Some(dir) = out {
        sinks.retain(|s| s.name != CLI_PNG_SINK);
        sinks.push(SinkConfig {
            name: CLI_PNG_SINK.to_string(),
            sink_type: SinkType::Png,
            queue_capacity: 100,
            overflow: OverflowPolicy::Block,
            params: HashMap::from([("path".to_string(), dir.display().to_string())]),
        });
    }
    if sinks.is_empty() {
        sinks.push(SinkConfig {
            name: "log".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 100,
            overflow: OverflowPolicy::Block,
            params: HashMap::new(),
        });
    }
    sinks
}
