//! Event timeline layout: marker rows and seek mapping.

use serde::Serialize;

use contracts::{ActionEvent, GameState, RallyState};

/// Marker width as a percentage of the timeline
pub const MARKER_WIDTH_PERCENT: f64 = 4.0;

/// One positioned action marker
#[derive(Debug, Clone, Serialize)]
pub struct TimelineMarker<'a> {
    pub action: &'a ActionEvent,
    /// Left edge, percent of the timeline
    pub position: f64,
    pub row: usize,
}

/// Non-overlapping marker layout
#[derive(Debug, Clone, Serialize)]
pub struct TimelineLayout<'a> {
    /// Markers in frame order
    pub markers: Vec<TimelineMarker<'a>>,
    /// At least 1
    pub row_count: usize,
}

/// Stack action markers into rows so none overlap
///
/// Actions are taken in frame order; each lands in the first row whose
/// last marker ends at or before its position, otherwise a new row opens.
pub fn assign_rows(
    actions: &[ActionEvent],
    total_frames: u64,
    marker_width_percent: f64,
) -> TimelineLayout<'_> {
    let mut sorted: Vec<&ActionEvent> = actions.iter().collect();
    sorted.sort_by_key(|a| a.frame);

    let mut row_ends: Vec<f64> = Vec::new();
    let markers = sorted
        .into_iter()
        .map(|action| {
            let position = frame_percent(action.frame, total_frames);
            let row = match row_ends.iter().position(|&end| position >= end) {
                Some(row) => row,
                None => {
                    row_ends.push(0.0);
                    row_ends.len() - 1
                }
            };
            row_ends[row] = position + marker_width_percent;
            TimelineMarker {
                action,
                position,
                row,
            }
        })
        .collect::<Vec<_>>();

    let row_count = markers.iter().map(|m| m.row + 1).max().unwrap_or(1);
    TimelineLayout { markers, row_count }
}

/// Playback time for a click at `fraction` (0-1) of the timeline width
///
/// The fraction is clamped and snapped to a whole frame.
pub fn seek_time(fraction: f64, total_frames: u64, fps: f64) -> f64 {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let fps = contracts::sanitize_fps(fps, contracts::DEFAULT_FPS);
    (fraction * total_frames as f64).round() / fps
}

/// Rally (play) span drawn behind the markers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaySegment {
    pub start_frame: u64,
    pub end_frame: u64,
    /// Left edge, percent
    pub left: f64,
    /// Width, percent
    pub width: f64,
}

/// Timeline spans of the in-play game states
pub fn play_segments(game_states: &[GameState], total_frames: u64) -> Vec<PlaySegment> {
    game_states
        .iter()
        .filter(|s| s.state == RallyState::Play && s.end_frame >= s.start_frame)
        .map(|s| PlaySegment {
            start_frame: s.start_frame,
            end_frame: s.end_frame,
            left: frame_percent(s.start_frame, total_frames),
            width: frame_percent(s.end_frame - s.start_frame, total_frames),
        })
        .collect()
}

fn frame_percent(frame: u64, total_frames: u64) -> f64 {
    if total_frames == 0 {
        return 0.0;
    }
    frame as f64 * 100.0 / total_frames as f64
}
