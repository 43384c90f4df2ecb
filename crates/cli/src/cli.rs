//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use contracts::TrackId;

/// Volley Overlay - analysis overlays for volleyball match video
#[derive(Parser, Debug)]
#[command(
    name = "volley-overlay",
    author,
    version,
    about = "Volleyball analysis overlay renderer",
    long_about = "Renders time-synchronised analysis overlays (player boxes, action boxes,\n\
                  ball trail, movement heatmap) from analysis results, exports them as\n\
                  transparent frames, and follows analysis progress."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "VOLLEY_OVERLAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "VOLLEY_OVERLAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "VOLLEY_OVERLAY_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render overlay frames and export them to the configured sinks
    Render(RenderArgs),

    /// Summarise analysis results
    Info(InfoArgs),

    /// Validate configuration file
    Validate(ValidateArgs),

    /// Follow analysis progress of a video
    Watch(WatchArgs),

    /// Manage manual jersey number mappings
    Jersey(JerseyArgs),
}

/// Viewer configuration and API overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ApiArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when omitted
    #[arg(short, long, env = "VOLLEY_OVERLAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the analysis API base URL
    #[arg(long, env = "VOLLEY_API_URL")]
    pub api_url: Option<String>,

    /// Override the progress WebSocket base URL
    #[arg(long, env = "VOLLEY_WS_URL")]
    pub ws_url: Option<String>,
}

/// Where analysis results come from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Analysis results JSON file
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Fetch results (and jersey mappings) for this video from the API
    #[arg(long)]
    pub video: Option<String>,
}

/// Arguments for the `render` command
#[derive(Parser, Debug, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub api: ApiArgs,

    /// Jersey mappings JSON file (as returned by the API)
    #[arg(long)]
    pub jerseys: Option<PathBuf>,

    /// Render a single playback time (seconds)
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub at: Option<f64>,

    /// Range start (seconds)
    #[arg(long, default_value = "0")]
    pub from: f64,

    /// Range end (seconds); defaults to the video duration
    #[arg(long)]
    pub to: Option<f64>,

    /// Output frame rate for range renders; defaults to the video frame rate
    #[arg(long)]
    pub fps_out: Option<f64>,

    /// Write PNG frames into this directory (in addition to configured sinks)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Force the heatmap on
    #[arg(long, conflicts_with = "no_heatmap")]
    pub heatmap: bool,

    /// Hide the heatmap
    #[arg(long)]
    pub no_heatmap: bool,

    /// Hide player boxes
    #[arg(long)]
    pub no_boxes: bool,

    /// Hide action boxes
    #[arg(long)]
    pub no_actions: bool,

    /// Hide the ball trail
    #[arg(long)]
    pub no_ball: bool,

    /// Highlight this player (track id)
    #[arg(long)]
    pub player: Option<TrackId>,

    /// Restrict the heatmap to this player (track id)
    #[arg(long)]
    pub heatmap_player: Option<TrackId>,

    /// Channel buffer between renderer and sinks
    #[arg(long, default_value = "64", env = "VOLLEY_OVERLAY_BUFFER_SIZE")]
    pub buffer_size: usize,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub api: ApiArgs,

    /// Jersey mappings JSON file (as returned by the API)
    #[arg(long)]
    pub jerseys: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "overlay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `watch` command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Video id
    #[arg(long)]
    pub video: String,

    /// Analysis task id for the polling fallback; looked up when omitted
    #[arg(long)]
    pub task: Option<String>,

    #[command(flatten)]
    pub api: ApiArgs,
}

/// Arguments for the `jersey` command
#[derive(Parser, Debug)]
pub struct JerseyArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[command(subcommand)]
    pub command: JerseyCommand,
}

/// Jersey mapping operations
#[derive(Subcommand, Debug)]
pub enum JerseyCommand {
    /// List confirmed mappings of a video
    List {
        #[arg(long)]
        video: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Confirm a jersey number for a track
    Set {
        #[arg(long)]
        video: String,

        #[arg(long)]
        track: TrackId,

        #[arg(long)]
        number: u32,

        /// Frame at which the number was confirmed
        #[arg(long, default_value = "0")]
        frame: u64,

        /// Player box at confirmation time, `x1,y1,x2,y2`
        #[arg(long)]
        bbox: Option<String>,
    },

    /// Remove the mapping of a track
    Delete {
        #[arg(long)]
        video: String,

        #[arg(long)]
        track: TrackId,
    },
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_requires_one_source() {
        assert!(Cli::try_parse_from(["volley-overlay", "render", "--at", "1"]).is_err());
        assert!(Cli::try_parse_from([
            "volley-overlay",
            "render",
            "--results",
            "r.json",
            "--video",
            "v1"
        ])
        .is_err());
    }

    #[test]
    fn test_render_flags() {
        let cli = Cli::try_parse_from([
            "volley-overlay",
            "-v",
            "render",
            "--results",
            "r.json",
            "--from",
            "1.5",
            "--to",
            "3",
            "--no-ball",
            "--player",
            "7",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.from, 1.5);
                assert_eq!(args.to, Some(3.0));
                assert!(args.no_ball);
                assert_eq!(args.player, Some(7));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_at_conflicts_with_range() {
        assert!(Cli::try_parse_from([
            "volley-overlay",
            "render",
            "--results",
            "r.json",
            "--at",
            "2",
            "--to",
            "3"
        ])
        .is_err());
    }

    #[test]
    fn test_jersey_set() {
        let cli = Cli::try_parse_from([
            "volley-overlay",
            "jersey",
            "set",
            "--video",
            "v1",
            "--track",
            "3",
            "--number",
            "12",
        ])
        .unwrap();
        match cli.command {
            Commands::Jersey(JerseyArgs {
                command: JerseyCommand::Set { track, number, frame, .. },
                ..
            }) => {
                assert_eq!((track, number, frame), (3, 12, 0));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
