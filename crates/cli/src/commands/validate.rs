//! `validate` command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{OverlayVisibility, ViewerConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Poll intervals below this hammer the analysis API
const MIN_SENSIBLE_POLL_MS: u64 = 500;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    api_url: String,
    ws_url: String,
    poll_interval_ms: u64,
    frame_tolerance: u32,
    visibility: OverlayVisibility,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    if !path.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    api_url: config.api.base_url.clone(),
                    ws_url: config.api.ws_url.clone(),
                    poll_interval_ms: config.api.poll_interval_ms,
                    frame_tolerance: config.overlay.frame_tolerance,
                    visibility: config.visibility,
                    sink_count: config.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ViewerConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.sinks.is_empty() {
        warnings.push("No sinks configured - renders go to the log sink only".to_string());
    }

    if !config.visibility.any() {
        warnings.push("All overlays are hidden at startup".to_string());
    }

    if config.api.poll_interval_ms < MIN_SENSIBLE_POLL_MS {
        warnings.push(format!(
            "api.poll_interval_ms is {}ms - polling fallback will be very chatty",
            config.api.poll_interval_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  API: {}", summary.api_url);
            println!("  WebSocket: {}", summary.ws_url);
            println!("  Poll interval: {}ms", summary.poll_interval_ms);
            println!("  Frame tolerance: {}", summary.frame_tolerance);
            println!(
                "  Visible: boxes={} actions={} ball={} heatmap={}",
                summary.visibility.player_boxes,
                summary.visibility.action_boxes,
                summary.visibility.ball_trail,
                summary.visibility.heatmap
            );
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
