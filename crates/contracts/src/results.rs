//! AnalysisResults - the complete analysis payload of one video.
//!
//! Fetched once per video and held in memory for the session.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    null_as_default, ActionDetection, ActionEvent, BallPosition, GameState, Play, PlayerTrack,
    ScoreEvent, VideoInfo,
};

/// Ball trajectory block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BallTracking {
    #[serde(deserialize_with = "null_as_default")]
    pub trajectory: Vec<BallPosition>,
    pub detected_frames: u64,
    pub total_frames: u64,
}

/// Action recognition block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionRecognition {
    #[serde(deserialize_with = "null_as_default")]
    pub actions: Vec<ActionEvent>,
    #[serde(deserialize_with = "null_as_default")]
    pub action_detections: Vec<ActionDetection>,
    pub action_counts: HashMap<String, u64>,
    pub total_actions: u64,
}

/// Nested player tracking block (older result files)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTracking {
    #[serde(deserialize_with = "null_as_default")]
    pub tracks: Vec<PlayerTrack>,
    pub total_detections: u64,
}

/// Complete analysis results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResults {
    #[serde(deserialize_with = "null_as_default")]
    pub video_info: VideoInfo,
    #[serde(deserialize_with = "null_as_default")]
    pub ball_tracking: BallTracking,
    #[serde(deserialize_with = "null_as_default")]
    pub action_recognition: ActionRecognition,
    #[serde(deserialize_with = "null_as_default")]
    pub players_tracking: Vec<PlayerTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_tracking: Option<PlayerTracking>,
    #[serde(deserialize_with = "null_as_default")]
    pub game_states: Vec<GameState>,
    #[serde(deserialize_with = "null_as_default")]
    pub scores: Vec<ScoreEvent>,
    #[serde(deserialize_with = "null_as_default")]
    pub plays: Vec<Play>,
    #[serde(deserialize_with = "null_as_default")]
    pub analysis_time: f64,
}

impl AnalysisResults {
    /// Per-frame player tracks, from whichever block the file carries
    pub fn player_tracks(&self) -> &[PlayerTrack] {
        if !self.players_tracking.is_empty() {
            return &self.players_tracking;
        }
        self.player_tracking
            .as_ref()
            .map(|t| t.tracks.as_slice())
            .unwrap_or(&[])
    }

    pub fn ball_trajectory(&self) -> &[BallPosition] {
        &self.ball_tracking.trajectory
    }

    pub fn actions(&self) -> &[ActionEvent] {
        &self.action_recognition.actions
    }

    /// Number of player detections across all frames
    pub fn total_player_detections(&self) -> usize {
        self.player_tracks().iter().map(|t| t.players.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_results() {
        let json = r#"{
            "video_info": {"width": 1920, "height": 1080, "fps": 30, "total_frames": 300, "duration": 10},
            "players_tracking": [{"frame": 0, "players": [{"id": 1, "bbox": [100, 100, 200, 400]}]}]
        }"#;
        let results: AnalysisResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.video_info.width, 1920);
        assert_eq!(results.player_tracks().len(), 1);
        assert!(results.ball_trajectory().is_empty());
        assert!(results.actions().is_empty());
    }

    #[test]
    fn test_nested_player_tracking_fallback() {
        let json = r#"{
            "player_tracking": {"tracks": [{"frame": 3, "players": []}], "total_detections": 0}
        }"#;
        let results: AnalysisResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.player_tracks().len(), 1);
        assert_eq!(results.player_tracks()[0].frame, Some(3));
    }

    #[test]
    fn test_nulls_only_blank_their_own_field() {
        let json = r#"{
            "video_info": {"width": 640, "height": 360, "fps": null},
            "players_tracking": [
                {"frame": 0, "players": null},
                {"frame": 1, "players": [{"id": 2, "bbox": [1, 2, 30, 40]}]}
            ],
            "ball_tracking": {"trajectory": [{"frame": 1, "center": [1, 2], "confidence": null}]},
            "action_recognition": {"actions": [{"frame": 1, "action": null}], "action_detections": null},
            "game_states": null,
            "scores": null,
            "plays": null,
            "analysis_time": null
        }"#;
        let results: AnalysisResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.video_info.effective_fps(), 30.0);
        assert_eq!(results.player_tracks().len(), 2);
        assert_eq!(results.total_player_detections(), 1);
        assert_eq!(results.ball_trajectory()[0].confidence, 0.0);
        assert_eq!(results.actions()[0].action, crate::ActionKind::Unknown);
        assert!(results.game_states.is_empty());

        let results: AnalysisResults =
            serde_json::from_str(r#"{"players_tracking": null, "ball_tracking": null}"#).unwrap();
        assert!(results.player_tracks().is_empty());
        assert!(results.ball_trajectory().is_empty());
    }

    #[test]
    fn test_empty_object() {
        let results: AnalysisResults = serde_json::from_str("{}").unwrap();
        assert!(!results.video_info.size().is_valid());
        assert_eq!(results.total_player_detections(), 0);
    }
}
