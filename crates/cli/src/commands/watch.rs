//! `watch` command implementation.

use analysis_client::{watch, AnalysisApi, ProgressMonitor};
use anyhow::{Context, Result};
use contracts::{ProgressStatus, ProgressUpdate, VideoStatus};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{load_config, shutdown_signal};
use crate::cli::WatchArgs;
use crate::error::CliError;

/// Execute the `watch` command
pub async fn run_watch(args: &WatchArgs) -> Result<()> {
    let config = load_config(&args.api)?;
    let api = AnalysisApi::new(&config.api).context("Failed to build API client")?;

    let mut task_id = args.task.clone();
    if task_id.is_none() {
        match api.get_video(&args.video).await {
            Ok(video) if video.status == VideoStatus::Completed => {
                println!("Analysis of {} already completed", args.video);
                return Ok(());
            }
            Ok(video) => task_id = video.task_id,
            Err(e) => {
                warn!(video_id = %args.video, error = %e, "Video lookup failed, polling fallback disabled");
            }
        }
    }

    info!(video_id = %args.video, task_id = ?task_id, "Watching analysis progress");
    let mut monitor = ProgressMonitor::new(&config, args.video.clone(), task_id, api);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let signal_task = tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        trigger.cancel();
    });

    let outcome = watch(&mut monitor, &cancel, print_update).await;
    signal_task.abort();
    let outcome = outcome.context("Progress stream failed")?;

    if outcome.cancelled {
        println!("Stopped after {} updates", outcome.updates);
        return Ok(());
    }

    match outcome.last {
        Some(update) if update.status == ProgressStatus::Failed => Err(CliError::AnalysisFailed {
            video_id: args.video.clone(),
            message: update
                .error
                .or(update.message)
                .unwrap_or_else(|| "no error message".to_string()),
        }
        .into()),
        Some(update) if update.status == ProgressStatus::Completed => {
            println!("Analysis of {} completed", args.video);
            Ok(())
        }
        _ => {
            warn!(video_id = %args.video, "Progress stream ended before a final status");
            Ok(())
        }
    }
}

fn print_update(update: &ProgressUpdate) {
    println!("{}", format_update(update));
}

fn format_update(update: &ProgressUpdate) -> String {
    let status = format!("{:?}", update.status).to_lowercase();
    match update.message.as_deref() {
        Some(message) => format!("[{:>5.1}%] {} - {}", update.percent(), status, message),
        None => format!("[{:>5.1}%] {}", update.percent(), status),
    }
}
