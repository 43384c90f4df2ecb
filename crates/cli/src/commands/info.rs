//! `info` command implementation.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use contracts::{ActionKind, AnalysisResults, TrackId};
use overlay_engine::{
    assign_rows, play_segments, BallTrail, JerseyResolver, OverlayConfig, MARKER_WIDTH_PERCENT,
};
use serde::Serialize;
use tracing::info;

use super::{load_config, load_results};
use crate::cli::InfoArgs;

/// Results summary for JSON output
#[derive(Serialize)]
struct ResultsInfo {
    video: VideoSummary,
    players: PlayerSummary,
    ball: BallSummary,
    actions: ActionSummary,
    rallies: usize,
    scores: usize,
}

#[derive(Serialize)]
struct VideoSummary {
    width: u32,
    height: u32,
    fps: f64,
    total_frames: u64,
    duration_s: f64,
}

#[derive(Serialize)]
struct PlayerSummary {
    tracked_frames: usize,
    detections: usize,
    /// Track id -> display label
    labels: BTreeMap<TrackId, String>,
}

#[derive(Serialize)]
struct BallSummary {
    positions: usize,
    accepted: usize,
    rejected_low_confidence: usize,
    rejected_jump: usize,
    rejected_velocity: usize,
    unpositioned: usize,
}

#[derive(Serialize)]
struct ActionSummary {
    total: usize,
    by_kind: BTreeMap<&'static str, usize>,
    timeline_rows: usize,
}

/// Execute the `info` command
pub async fn run_info(args: &InfoArgs) -> Result<()> {
    let config = load_config(&args.api)?;
    let loaded = load_results(&args.source, args.jerseys.as_deref(), &config).await?;

    let jerseys = JerseyResolver::new(
        loaded.results.player_tracks(),
        &loaded.mappings,
        HashMap::new(),
    );
    let summary = build_info(&loaded.results, &jerseys, &config.overlay);
    info!(
        players = summary.players.labels.len(),
        actions = summary.actions.total,
        "Results summarised"
    );

    if args.json {
        let json =
            serde_json::to_string_pretty(&summary).context("Failed to serialize results info")?;
        println!("{}", json);
    } else {
        print_info(&summary);
    }

    Ok(())
}

fn build_info(
    results: &AnalysisResults,
    jerseys: &JerseyResolver,
    overlay: &OverlayConfig,
) -> ResultsInfo {
    let video_info = &results.video_info;
    let fps = contracts::sanitize_fps(video_info.fps, overlay.default_fps);
    let total_frames = video_info.effective_total_frames();

    let trail = BallTrail::build(results.ball_trajectory(), fps, &overlay.ball);
    let rejected = trail.rejected();

    let mut by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
    for action in results.actions() {
        *by_kind.entry(action.action.as_str()).or_default() += 1;
    }
    // Legend kinds always listed
    for kind in ActionKind::ALL {
        by_kind.entry(kind.as_str()).or_default();
    }

    // Tracks without any jersey source still get their generic label
    let labels = results
        .player_tracks()
        .iter()
        .flat_map(|t| t.players.iter().map(|p| p.id))
        .chain(jerseys.known_track_ids())
        .map(|id| (id, jerseys.label(id)))
        .collect();

    ResultsInfo {
        video: VideoSummary {
            width: video_info.width,
            height: video_info.height,
            fps,
            total_frames,
            duration_s: total_frames as f64 / fps,
        },
        players: PlayerSummary {
            tracked_frames: results.player_tracks().len(),
            detections: results.total_player_detections(),
            labels,
        },
        ball: BallSummary {
            positions: results.ball_trajectory().len(),
            accepted: trail.points().len(),
            rejected_low_confidence: rejected.low_confidence,
            rejected_jump: rejected.jump,
            rejected_velocity: rejected.velocity,
            unpositioned: rejected.unpositioned,
        },
        actions: ActionSummary {
            total: results.actions().len(),
            by_kind,
            timeline_rows: assign_rows(results.actions(), total_frames, MARKER_WIDTH_PERCENT)
                .row_count,
        },
        rallies: play_segments(&results.game_states, total_frames).len(),
        scores: results.scores.len(),
    }
}

fn print_info(summary: &ResultsInfo) {
    println!("\n=== Analysis Results ===\n");

    let video = &summary.video;
    println!("Video:");
    println!("  Size: {}x{}", video.width, video.height);
    println!("  FPS: {:.2}", video.fps);
    println!("  Frames: {} ({:.1}s)", video.total_frames, video.duration_s);

    let players = &summary.players;
    println!("\nPlayers:");
    println!("  Tracked frames: {}", players.tracked_frames);
    println!("  Detections: {}", players.detections);
    for (track_id, label) in &players.labels {
        println!("  - track {}: {}", track_id, label);
    }

    let ball = &summary.ball;
    println!("\nBall:");
    println!("  Positions: {}", ball.positions);
    println!("  Accepted: {}", ball.accepted);
    println!(
        "  Rejected: {} low confidence, {} jump, {} velocity, {} unpositioned",
        ball.rejected_low_confidence, ball.rejected_jump, ball.rejected_velocity, ball.unpositioned
    );

    let actions = &summary.actions;
    println!("\nActions: {}", actions.total);
    for (kind, count) in &actions.by_kind {
        println!("  - {}: {}", kind, count);
    }
    println!("  Timeline rows: {}", actions.timeline_rows);

    println!("\nRallies: {}", summary.rallies);
    println!("Scores: {}", summary.scores);
}
