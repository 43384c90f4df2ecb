//! Video metadata and analysis task contracts.

use serde::{Deserialize, Serialize};

use crate::null_as_default;

/// Fallback frame rate when the analysis reports none or an invalid one
pub const DEFAULT_FPS: f64 = 30.0;

/// Video info block of the analysis results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    /// Source width in pixels
    #[serde(deserialize_with = "null_as_default")]
    pub width: u32,
    /// Source height in pixels
    #[serde(deserialize_with = "null_as_default")]
    pub height: u32,
    /// Fixed frame rate of the source video; `null` falls back to 30
    #[serde(deserialize_with = "null_as_default")]
    pub fps: f64,
    /// Total frame count
    #[serde(deserialize_with = "null_as_default")]
    pub total_frames: u64,
    /// Duration in seconds
    #[serde(deserialize_with = "null_as_default")]
    pub duration: f64,
}

impl VideoInfo {
    /// Source resolution
    pub fn size(&self) -> VideoSize {
        VideoSize::new(self.width, self.height)
    }

    /// Frame rate with the invalid/zero guard applied
    pub fn effective_fps(&self) -> f64 {
        sanitize_fps(self.fps, DEFAULT_FPS)
    }

    /// Total frames, derived from duration when not reported
    pub fn effective_total_frames(&self) -> u64 {
        if self.total_frames > 0 {
            return self.total_frames;
        }
        let derived = (self.duration.max(0.0) * self.effective_fps()).round();
        if derived.is_finite() && derived > 0.0 {
            derived as u64
        } else {
            0
        }
    }
}

/// Replace a non-finite or non-positive frame rate with `fallback`
#[inline]
pub fn sanitize_fps(fps: f64, fallback: f64) -> f64 {
    if fps.is_finite() && fps > 0.0 {
        fps
    } else if fallback.is_finite() && fallback > 0.0 {
        fallback
    } else {
        DEFAULT_FPS
    }
}

/// Pixel size of the source video (and of every overlay canvas)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions are non-zero
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Lifecycle status of an uploaded video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    #[default]
    Uploaded,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Video record as listed by the analysis API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    pub id: String,
    pub filename: String,
    pub original_filename: Option<String>,
    pub file_path: String,
    pub upload_time: String,
    pub status: VideoStatus,
    pub file_size: u64,
    pub task_id: Option<String>,
    pub analysis_time: Option<String>,
}

/// Analysis task status as returned by the polling endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisTask {
    pub video_id: String,
    pub status: String,
    pub start_time: Option<String>,
    pub progress: f64,
    pub end_time: Option<String>,
    pub error: Option<String>,
}
