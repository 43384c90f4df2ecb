//! Command implementations.

mod info;
mod jersey;
mod render;
mod validate;
mod watch;

pub use info::run_info;
pub use jersey::run_jersey;
pub use render::run_render;
pub use validate::run_validate;
pub use watch::run_watch;

use std::collections::HashMap;
use std::path::Path;

use analysis_client::AnalysisApi;
use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{AnalysisResults, JerseyMapping, JerseyMappingsResponse, TrackId, ViewerConfig};
use tracing::{info, warn};

use crate::cli::{ApiArgs, SourceArgs};
use crate::error::CliError;

/// Load the viewer config and apply CLI overrides
pub(crate) fn load_config(args: &ApiArgs) -> Result<ViewerConfig> {
    if let Some(path) = &args.config {
        if !path.exists() {
            return Err(CliError::config_not_found(path.display().to_string()).into());
        }
    }

    let mut config = ConfigLoader::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(url) = &args.api_url {
        info!(api_url = %url, "Overriding API base URL from CLI");
        config.api.base_url = url.clone();
    }
    if let Some(url) = &args.ws_url {
        info!(ws_url = %url, "Overriding WebSocket URL from CLI");
        config.api.ws_url = url.clone();
    }
    if args.api_url.is_some() || args.ws_url.is_some() {
        ConfigLoader::validate(&config).context("Invalid API override")?;
    }

    Ok(config)
}

/// Results plus the manual jersey mappings that go with them
pub(crate) struct LoadedResults {
    pub results: AnalysisResults,
    pub mappings: HashMap<TrackId, JerseyMapping>,
}

/// Read results from a file, or fetch them (and jersey mappings) from the API
pub(crate) async fn load_results(
    source: &SourceArgs,
    jerseys: Option<&Path>,
    config: &ViewerConfig,
) -> Result<LoadedResults> {
    let mut loaded = match (&source.results, &source.video) {
        (Some(path), _) => LoadedResults {
            results: read_json(path)?,
            mappings: HashMap::new(),
        },
        (None, Some(video_id)) => fetch_results(video_id, config).await?,
        (None, None) => anyhow::bail!("Either --results or --video is required"),
    };

    if let Some(path) = jerseys {
        let response: JerseyMappingsResponse = read_json(path)?;
        loaded.mappings.extend(response.by_track_id());
    }

    info!(
        width = loaded.results.video_info.width,
        height = loaded.results.video_info.height,
        fps = loaded.results.video_info.fps,
        player_frames = loaded.results.player_tracks().len(),
        ball_points = loaded.results.ball_trajectory().len(),
        actions = loaded.results.actions().len(),
        jersey_mappings = loaded.mappings.len(),
        "Analysis results loaded"
    );
    Ok(loaded)
}

async fn fetch_results(video_id: &str, config: &ViewerConfig) -> Result<LoadedResults> {
    let api = AnalysisApi::new(&config.api).context("Failed to build API client")?;
    let results = api
        .get_results(video_id)
        .await
        .with_context(|| format!("Failed to fetch results for video {video_id}"))?;

    // Mappings are optional; the overlay falls back to voted numbers
    let mappings = match api.get_jersey_mappings(video_id).await {
        Ok(response) => response.by_track_id(),
        Err(e) => {
            warn!(video_id, error = %e, "Failed to load jersey mappings");
            HashMap::new()
        }
    };

    Ok(LoadedResults { results, mappings })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CliError::results_load(path.display().to_string(), e.to_string()))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| CliError::results_load(path.display().to_string(), e.to_string()))?;
    Ok(value)
}

/// Resolves on Ctrl+C or SIGTERM; never resolves if no handler can be installed
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
