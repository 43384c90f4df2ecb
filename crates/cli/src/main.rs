//! # Volley Overlay CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Overlay rendering and frame export
//! - Results summaries and configuration validation
//! - Analysis progress watching and jersey mapping management

mod cli;
mod commands;
mod error;
mod export;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_jersey, run_render, run_validate, run_watch};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Volley Overlay CLI starting"
    );

    let result = match &cli.command {
        Commands::Render(args) => run_render(args).await,
        Commands::Info(args) => run_info(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Watch(args) => run_watch(args).await,
        Commands::Jersey(args) => run_jersey(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Initialize logging and metrics based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    observability::init_with_config(observability_config(cli))
}

fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: (cli.metrics_port != 0).then_some(cli.metrics_port),
        default_log_level: default_log_level.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observability_config_from_flags() {
        let cli = Cli::try_parse_from(["volley-overlay", "-vv", "validate"]).unwrap();
        let config = observability_config(&cli);
        assert_eq!(config.default_log_level, "trace");
        assert_eq!(config.metrics_port, None);

        let cli = Cli::try_parse_from([
            "volley-overlay",
            "--quiet",
            "--metrics-port",
            "9100",
            "validate",
        ])
        .unwrap();
        let config = observability_config(&cli);
        assert_eq!(config.default_log_level, "warn");
        assert_eq!(config.metrics_port, Some(9100));
    }
}
