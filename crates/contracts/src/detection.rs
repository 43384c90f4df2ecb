//! Per-frame detection records produced by the external analysis service.
//!
//! Records are immutable once loaded. Coordinates are tolerated in
//! malformed shapes (short arrays, `null` entries) and rejected lazily at
//! render time through [`BoundingBox::from_slice`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::Point;

/// Tracker-assigned identifier, stable across frames for one physical player
pub type TrackId = i64;

/// Axis-aligned box `[x1, y1, x2, y2]` in source pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from a raw coordinate array.
    ///
    /// Returns `None` when fewer than 4 values are present or any of the
    /// first four is not finite.
    pub fn from_slice(coords: &[f64]) -> Option<Self> {
        match coords {
            [x1, y1, x2, y2, ..] if [x1, y1, x2, y2].iter().all(|v| v.is_finite()) => {
                Some(Self::new(*x1, *y1, *x2, *y2))
            }
            _ => None,
        }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Deserialize a coordinate array leniently: missing → empty, `null` → NaN.
pub fn lenient_coords<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Option<f64>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Deserialize `null` as the type's default (missing fields need `#[serde(default)]` too)
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One detected player in a frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerDetection {
    pub id: TrackId,
    #[serde(default)]
    pub stable_id: Option<TrackId>,
    #[serde(default, deserialize_with = "lenient_coords")]
    pub bbox: Vec<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub label: Option<String>,
}

impl PlayerDetection {
    /// Validated bounding box, `None` when malformed
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_slice(&self.bbox)
    }
}

/// Player detections for one analysed frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerTrack {
    #[serde(default)]
    pub frame: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<PlayerDetection>,
}

/// Ball detection from the trajectory model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BallPosition {
    #[serde(default)]
    pub frame: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coords")]
    pub center: Vec<f64>,
    #[serde(default, deserialize_with = "lenient_coords")]
    pub bbox: Vec<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
}

impl BallPosition {
    /// Ball centre, falling back to the bbox centre
    pub fn center_point(&self) -> Option<Point> {
        match self.center.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Some(Point::new(*x, *y)),
            _ => BoundingBox::from_slice(&self.bbox).map(|b| b.center()),
        }
    }
}

/// Closed set of recognised volleyball actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Spike,
    Set,
    Receive,
    Serve,
    Block,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ActionKind {
    /// Legend order used by the timeline
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Serve,
        ActionKind::Receive,
        ActionKind::Set,
        ActionKind::Spike,
        ActionKind::Block,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Spike => "spike",
            ActionKind::Set => "set",
            ActionKind::Receive => "receive",
            ActionKind::Serve => "serve",
            ActionKind::Block => "block",
            ActionKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merged action event (may span several frames)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionEvent {
    pub frame: u64,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub end_frame: Option<u64>,
    #[serde(default)]
    pub end_timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coords")]
    pub bbox: Vec<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: ActionKind,
    #[serde(default)]
    pub player_id: Option<TrackId>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl ActionEvent {
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_slice(&self.bbox)
    }
}

/// Raw per-frame action detection (before merging)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionDetection {
    pub frame: u64,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coords")]
    pub bbox: Vec<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: ActionKind,
    #[serde(default)]
    pub player_id: Option<TrackId>,
}

/// Rally state of a frame span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RallyState {
    Play,
    #[serde(rename = "No-Play")]
    NoPlay,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Game state segment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameState {
    pub start_frame: u64,
    pub end_frame: u64,
    #[serde(default)]
    pub state: RallyState,
}

/// Score event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub frame: u64,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub player_id: Option<TrackId>,
    #[serde(default)]
    pub team: Option<String>,
}

/// Play segment (rally)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Play {
    pub play_id: u64,
    pub start_frame: u64,
    pub start_timestamp: f64,
    pub end_frame: u64,
    pub end_timestamp: f64,
    pub duration: f64,
    pub actions: Vec<ActionEvent>,
    pub scores: Vec<ScoreEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_short_slice() {
        assert!(BoundingBox::from_slice(&[1.0, 2.0, 3.0]).is_none());
        assert!(BoundingBox::from_slice(&[]).is_none());
        assert!(BoundingBox::from_slice(&[1.0, f64::NAN, 3.0, 4.0]).is_none());
        assert_eq!(
            BoundingBox::from_slice(&[1.0, 2.0, 3.0, 4.0, 9.0]),
            Some(BoundingBox::new(1.0, 2.0, 3.0, 4.0))
        );
    }

    #[test]
    fn test_player_with_null_coordinates() {
        let player: PlayerDetection =
            serde_json::from_str(r#"{"id": 3, "bbox": [10, null, 30, 40]}"#).unwrap();
        assert_eq!(player.bbox.len(), 4);
        assert!(player.bounding_box().is_none());
    }

    #[test]
    fn test_player_without_bbox() {
        let player: PlayerDetection = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert!(player.bounding_box().is_none());
    }

    #[test]
    fn test_action_kind_unknown() {
        let event: ActionEvent =
            serde_json::from_str(r#"{"frame": 5, "action": "dig"}"#).unwrap();
        assert_eq!(event.action, ActionKind::Unknown);

        let event: ActionEvent =
            serde_json::from_str(r#"{"frame": 5, "action": "spike"}"#).unwrap();
        assert_eq!(event.action, ActionKind::Spike);
    }

    #[test]
    fn test_null_fields_fall_back_to_defaults() {
        let ball: BallPosition =
            serde_json::from_str(r#"{"frame": 1, "center": [1, 2], "confidence": null}"#).unwrap();
        assert_eq!(ball.confidence, 0.0);
        assert_eq!(ball.center_point(), Some(Point::new(1.0, 2.0)));

        let track: PlayerTrack = serde_json::from_str(r#"{"frame": 4, "players": null}"#).unwrap();
        assert_eq!(track.frame, Some(4));
        assert!(track.players.is_empty());

        let event: ActionEvent = serde_json::from_str(r#"{"frame": 5, "action": null}"#).unwrap();
        assert_eq!(event.action, ActionKind::Unknown);
        let raw: ActionDetection =
            serde_json::from_str(r#"{"frame": 5, "action": null}"#).unwrap();
        assert_eq!(raw.action, ActionKind::Unknown);
    }

    #[test]
    fn test_ball_center_falls_back_to_bbox() {
        let ball: BallPosition =
            serde_json::from_str(r#"{"frame": 1, "bbox": [0, 0, 10, 20], "confidence": 0.9}"#)
                .unwrap();
        assert_eq!(ball.center_point(), Some(Point::new(5.0, 10.0)));
    }

    #[test]
    fn test_rally_state() {
        let gs: GameState =
            serde_json::from_str(r#"{"start_frame": 0, "end_frame": 9, "state": "No-Play"}"#)
                .unwrap();
        assert_eq!(gs.state, RallyState::NoPlay);
    }
}
