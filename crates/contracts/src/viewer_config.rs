//! ViewerConfig - Config Loader output
//!
//! Describes the complete viewer setup: API endpoints, overlay tuning,
//! default visibility and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{OverlayConfig, OverlayVisibility};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete viewer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ViewerConfig {
    #[serde(default)]
    pub version: ConfigVersion,

    /// External analysis API
    #[serde(default)]
    #[validate(nested)]
    pub api: ApiConfig,

    /// Overlay engine tuning
    #[serde(default)]
    #[validate(nested)]
    pub overlay: OverlayConfig,

    /// Overlays enabled at startup
    #[serde(default)]
    pub visibility: OverlayVisibility,

    /// Output routing for exported overlay frames
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Analysis API endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ApiConfig {
    /// REST base URL (e.g. `http://localhost:8000`)
    #[serde(default = "default_base_url")]
    #[validate(length(min = 1))]
    pub base_url: String,

    /// WebSocket base URL (e.g. `ws://localhost:8000`)
    #[serde(default = "default_ws_url")]
    #[validate(length(min = 1))]
    pub ws_url: String,

    /// Task status polling interval when the socket is unavailable
    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 100, max = 600_000))]
    pub poll_interval_ms: u64,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_s")]
    #[validate(range(min = 1, max = 3600))]
    pub request_timeout_s: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: default_ws_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_s: default_request_timeout_s(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_request_timeout_s() -> u64 {
    30
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// What happens when the queue is full
    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Behaviour of a sink queue at capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Wait for the sink to catch up; every frame is delivered
    #[default]
    Block,
    /// Drop the frame and count it
    Drop,
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// Transparent PNG per frame
    Png,
    /// Draw commands as JSON lines
    Json,
}

impl std::fmt::Display for SinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SinkType::Log => "log",
            SinkType::Png => "png",
            SinkType::Json => "json",
        })
    }
}

impl ViewerConfig {
    /// Progress WebSocket URL for a video
    pub fn progress_url(&self, video_id: &str) -> String {
        format!(
            "{}/ws/progress/{}",
            self.api.ws_url.trim_end_matches('/'),
            video_id
        )
    }
}
