//! Analysis progress contracts and the ProgressSource trait.
//!
//! Progress arrives over a WebSocket, with HTTP polling as a fallback.
//! Both strategies sit behind [`ProgressSource`].

use serde::{Deserialize, Serialize};

use crate::{AnalysisTask, ContractError};

/// Status reported by the analysis pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Started,
    #[default]
    Processing,
    Completed,
    Failed,
    /// Any other video status (e.g. `uploaded`) reported verbatim by the server
    #[serde(other)]
    Other,
}

impl ProgressStatus {
    /// Completed or failed; no further updates follow
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Completed | ProgressStatus::Failed)
    }

    /// Parse a free-form status string from the polling endpoint
    pub fn parse(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "started" => Self::Started,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Other,
        }
    }
}

/// One progress message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    #[serde(default)]
    pub status: ProgressStatus,
    /// Percent, 0-100
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProgressUpdate {
    /// Progress clamped into 0-100
    pub fn percent(&self) -> f64 {
        if self.progress.is_finite() {
            self.progress.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

impl From<AnalysisTask> for ProgressUpdate {
    fn from(task: AnalysisTask) -> Self {
        let status = ProgressStatus::parse(&task.status);
        let progress = if status == ProgressStatus::Completed {
            100.0
        } else {
            task.progress
        };
        Self {
            status,
            progress,
            message: None,
            error: task.error,
        }
    }
}

/// Progress update source
///
/// Yields updates until a terminal status, then `Ok(None)`.
#[trait_variant::make(ProgressSource: Send)]
pub trait LocalProgressSource {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Wait for the next update
    ///
    /// # Errors
    /// Returns a progress error when the underlying channel fails
    async fn next_update(&mut self) -> Result<Option<ProgressUpdate>, ContractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_message() {
        let json = r#"{"status": "processing", "progress": 42.5, "message": "Monitoring"}"#;
        let update: ProgressUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.status, ProgressStatus::Processing);
        assert!((update.percent() - 42.5).abs() < 1e-9);
    }

    #[test]
    fn test_other_status_passthrough() {
        let json = r#"{"status": "uploaded", "progress": 0}"#;
        let update: ProgressUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(update.status, ProgressStatus::Other);
        assert!(!update.status.is_terminal());
    }

    #[test]
    fn test_task_conversion() {
        let task = AnalysisTask {
            status: "completed".into(),
            progress: 97.0,
            ..Default::default()
        };
        let update = ProgressUpdate::from(task);
        assert!(update.status.is_terminal());
        assert_eq!(update.progress, 100.0);
    }

    #[test]
    fn test_percent_clamped() {
        let update = ProgressUpdate {
            progress: 140.0,
            ..Default::default()
        };
        assert_eq!(update.percent(), 100.0);
    }
}
