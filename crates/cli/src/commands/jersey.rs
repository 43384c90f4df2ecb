//! `jersey` command implementation.

use analysis_client::AnalysisApi;
use anyhow::{Context, Result};
use contracts::{JerseyMapping, SetJerseyMappingRequest, TrackId};
use tracing::info;

use super::load_config;
use crate::cli::{JerseyArgs, JerseyCommand};
use crate::error::CliError;

/// Execute the `jersey` command
pub async fn run_jersey(args: &JerseyArgs) -> Result<()> {
    let config = load_config(&args.api)?;
    let api = AnalysisApi::new(&config.api).context("Failed to build API client")?;

    match &args.command {
        JerseyCommand::List { video, json } => {
            let response = api
                .get_jersey_mappings(video)
                .await
                .with_context(|| format!("Failed to list jersey mappings of video {video}"))?;
            if *json {
                let json = serde_json::to_string_pretty(&response)
                    .context("Failed to serialize jersey mappings")?;
                println!("{}", json);
            } else {
                print_mappings(video, &sorted(response.by_track_id()));
            }
        }
        JerseyCommand::Set {
            video,
            track,
            number,
            frame,
            bbox,
        } => {
            let bbox = match bbox {
                Some(raw) => parse_bbox(raw)?,
                None => Vec::new(),
            };
            let request = SetJerseyMappingRequest {
                video_id: video.clone(),
                track_id: *track,
                jersey_number: *number,
                frame: *frame,
                bbox,
            };
            api.set_jersey_mapping(&request)
                .await
                .with_context(|| format!("Failed to set jersey mapping for track {track}"))?;
            info!(video_id = %video, track_id = track, jersey_number = number, "Jersey mapping saved");
            println!("Track {} -> #{}", track, number);
        }
        JerseyCommand::Delete { video, track } => {
            api.delete_jersey_mapping(video, *track)
                .await
                .with_context(|| format!("Failed to delete jersey mapping for track {track}"))?;
            info!(video_id = %video, track_id = track, "Jersey mapping removed");
            println!("Track {} mapping removed", track);
        }
    }

    Ok(())
}

fn sorted(mappings: std::collections::HashMap<TrackId, JerseyMapping>) -> Vec<(TrackId, JerseyMapping)> {
    let mut mappings: Vec<_> = mappings.into_iter().collect();
    mappings.sort_by_key(|(track_id, _)| *track_id);
    mappings
}

fn print_mappings(video: &str, mappings: &[(TrackId, JerseyMapping)]) {
    if mappings.is_empty() {
        println!("No jersey mappings for video {}", video);
        return;
    }
    println!("Jersey mappings for video {}:", video);
    for (track_id, mapping) in mappings {
        println!(
            "  track {:>4} -> #{:<3} (frame {})",
            track_id, mapping.jersey_number, mapping.frame
        );
    }
}

/// Parse `x1,y1,x2,y2`
fn parse_bbox(raw: &str) -> std::result::Result<Vec<f64>, CliError> {
    let invalid = || CliError::InvalidBbox {
        value: raw.to_string(),
    };
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if values.len() != 4 || values.iter().any(|v| !v.is_finite()) {
        return Err(invalid());
    }
    Ok(values)
}
