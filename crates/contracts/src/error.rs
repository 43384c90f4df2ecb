//! Layered error definitions
//!
//! Categorized by source: config / api / progress / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Analysis Data Errors =====
    /// Analysis results could not be decoded
    #[error("results parse error for video '{video_id}': {message}")]
    ResultsParse { video_id: String, message: String },

    // ===== API Errors =====
    /// Analysis API request failed
    #[error("api request error: {message}")]
    ApiRequest { message: String },

    /// Analysis API answered with a non-success status
    #[error("api error ({status}): {body}")]
    ApiStatus { status: u16, body: String },

    // ===== Progress Errors =====
    /// Progress channel could not be opened or broke mid-stream
    #[error("progress source '{source_name}' error: {message}")]
    Progress {
        source_name: String,
        message: String,
    },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create progress source error
    pub fn progress(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Progress {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
