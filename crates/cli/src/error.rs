//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Results file could not be read or decoded
    #[error("Failed to load analysis results from {path}: {message}")]
    ResultsLoad { path: String, message: String },

    /// Requested render times make no sense
    #[error("Invalid time range: {message}")]
    InvalidTimeRange { message: String },

    /// `--bbox` is not four comma separated numbers
    #[error("Invalid bbox '{value}': expected x1,y1,x2,y2")]
    InvalidBbox { value: String },

    /// Analysis ended in failure
    #[error("Analysis failed for video {video_id}: {message}")]
    AnalysisFailed { video_id: String, message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn results_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResultsLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_time_range(message: impl Into<String>) -> Self {
        Self::InvalidTimeRange {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CliError::config_not_found("overlay.toml").to_string(),
            "Configuration file not found: overlay.toml"
        );
        let err = CliError::AnalysisFailed {
            video_id: "v1".into(),
            message: "decoder crashed".into(),
        };
        assert_eq!(err.to_string(), "Analysis failed for video v1: decoder crashed");
    }
}
