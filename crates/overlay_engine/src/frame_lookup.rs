//! Nearest-frame lookup and windowed accumulation.
//!
//! Playback time maps to a frame index with `round(max(t, 0) * fps)`.
//! Detection arrays are sparse (the tracker may skip frames), so "the
//! current detection" is the record nearest to that index, accepted only
//! within a frame tolerance.

use std::cmp::Ordering;

use contracts::{sanitize_fps, ActionEvent, BallPosition, PlayerTrack};

/// A record positioned on the frame axis
pub trait FrameIndexed {
    /// Explicit frame index, if the record carries one
    fn frame_index(&self) -> Option<u64>;

    /// Timestamp in seconds, if the record carries one
    fn timestamp(&self) -> Option<f64> {
        None
    }

    /// Frame index, derived from the timestamp when missing
    fn resolved_frame(&self, fps: f64) -> Option<u64> {
        self.frame_index()
            .or_else(|| self.timestamp().and_then(|t| time_to_frame(t, fps)))
    }
}

impl FrameIndexed for PlayerTrack {
    fn frame_index(&self) -> Option<u64> {
        self.frame
    }

    fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }
}

impl FrameIndexed for BallPosition {
    fn frame_index(&self) -> Option<u64> {
        self.frame
    }

    fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }
}

impl FrameIndexed for ActionEvent {
    fn frame_index(&self) -> Option<u64> {
        Some(self.frame)
    }

    fn timestamp(&self) -> Option<f64> {
        self.timestamp
    }
}

fn time_to_frame(time: f64, fps: f64) -> Option<u64> {
    if !time.is_finite() {
        return None;
    }
    Some((time.max(0.0) * fps).round() as u64)
}

/// Frame index at playback time `time`
///
/// Negative and NaN times clamp to frame 0; an invalid `fps` falls back
/// to `fallback_fps`.
#[inline]
pub fn current_frame(time: f64, fps: f64, fallback_fps: f64) -> u64 {
    let fps = sanitize_fps(fps, fallback_fps);
    // NaN.max(0.0) is 0.0; +inf saturates
    (time.max(0.0) * fps).round() as u64
}

/// Number of frames covering `seconds` of playback
#[inline]
pub fn window_frames(seconds: f64, fps: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * fps).round() as u64
}

/// Record nearest to `current`, within `tolerance` frames (inclusive)
///
/// Records without a frame index are ignored. On equal distance the lower
/// frame index wins; among identical indices the earlier element wins.
pub fn nearest_frame<T: FrameIndexed>(frames: &[T], current: u64, tolerance: u32) -> Option<&T> {
    let mut best: Option<(u64, u64, &T)> = None;

    for record in frames {
        let Some(frame) = record.frame_index() else {
            continue;
        };
        let distance = frame.abs_diff(current);
        if distance > u64::from(tolerance) {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_distance, best_frame, _)) => match distance.cmp(&best_distance) {
                Ordering::Less => true,
                Ordering::Equal => frame < best_frame,
                Ordering::Greater => false,
            },
        };
        if better {
            best = Some((distance, frame, record));
        }
    }

    best.map(|(_, _, record)| record)
}

/// Records with `current - window ≤ frame ≤ current`, in array order
///
/// The lower bound clamps at frame 0.
pub fn frames_in_window<T: FrameIndexed>(
    frames: &[T],
    current: u64,
    window: u64,
) -> impl Iterator<Item = &T> {
    let min_frame = current.saturating_sub(window);
    frames.iter().filter(move |record| {
        record
            .frame_index()
            .is_some_and(|frame| frame >= min_frame && frame <= current)
    })
}
