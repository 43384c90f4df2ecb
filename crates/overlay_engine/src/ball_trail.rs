//! Ball trajectory trail with physical-plausibility filtering.
//!
//! The detector emits false positives (a player's head, a court light).
//! Points that are unconfident, or that would require the ball to teleport,
//! are dropped before the trail is drawn. Each point is compared with the
//! last *accepted* point, so one outlier cannot drag the reference away.

use contracts::{BallPosition, BallTrailConfig, Canvas, DrawCommand, Point, Rgba};

use crate::frame_lookup::{window_frames, FrameIndexed};

/// Trail colour (amber-300)
pub const TRAIL_COLOR: Rgba = Rgba::opaque(0xfc, 0xd3, 0x4d);

/// Lowest segment alpha at the tail of the trail
const TAIL_ALPHA: f64 = 0.2;

/// Why a point was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// No usable centre or frame position
    Unpositioned,
    LowConfidence,
    Jump,
    Velocity,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Unpositioned => "unpositioned",
            RejectReason::LowConfidence => "low_confidence",
            RejectReason::Jump => "jump",
            RejectReason::Velocity => "velocity",
        }
    }
}

/// Rejection tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectCounts {
    pub unpositioned: usize,
    pub low_confidence: usize,
    pub jump: usize,
    pub velocity: usize,
}

impl RejectCounts {
    fn bump(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::Unpositioned => self.unpositioned += 1,
            RejectReason::LowConfidence => self.low_confidence += 1,
            RejectReason::Jump => self.jump += 1,
            RejectReason::Velocity => self.velocity += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.unpositioned + self.low_confidence + self.jump + self.velocity
    }
}

/// Accepted ball position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub frame: u64,
    pub timestamp: Option<f64>,
    pub center: Point,
    pub confidence: f64,
}

/// Filtered, frame-ordered ball trajectory
#[derive(Debug, Clone, Default)]
pub struct BallTrail {
    points: Vec<TrailPoint>,
    rejected: RejectCounts,
}

impl BallTrail {
    /// Sort and filter a raw trajectory
    ///
    /// Points are ordered by frame (derived from the timestamp when the
    /// frame is missing). Exclusion thresholds are strict: a point exactly at
    /// `min_confidence`, `max_jump_px` or `max_velocity_px_s` is kept.
    pub fn build(trajectory: &[BallPosition], fps: f64, config: &BallTrailConfig) -> Self {
        let mut rejected = RejectCounts::default();

        let mut candidates: Vec<TrailPoint> = trajectory
            .iter()
            .filter_map(|raw| {
                let positioned = raw
                    .resolved_frame(fps)
                    .zip(raw.center_point())
                    .filter(|(_, center)| center.is_finite());
                match positioned {
                    Some((frame, center)) => Some(TrailPoint {
                        frame,
                        timestamp: raw.timestamp.filter(|t| t.is_finite()),
                        center,
                        confidence: raw.confidence,
                    }),
                    None => {
                        rejected.bump(RejectReason::Unpositioned);
                        None
                    }
                }
            })
            .collect();
        // Stable: equal frames keep array order
        candidates.sort_by_key(|p| p.frame);

        let mut points: Vec<TrailPoint> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match check_point(points.last(), &candidate, fps, config) {
                Ok(()) => points.push(candidate),
                Err(reason) => rejected.bump(reason),
            }
        }

        Self { points, rejected }
    }

    /// Every accepted point, frame-ordered
    pub fn points(&self) -> &[TrailPoint] {
        &self.points
    }

    pub fn rejected(&self) -> RejectCounts {
        self.rejected
    }

    /// Accepted points in `[current - window, current]`
    pub fn window(&self, current: u64, window: u64) -> &[TrailPoint] {
        let min_frame = current.saturating_sub(window);
        let start = self.points.partition_point(|p| p.frame < min_frame);
        let end = self.points.partition_point(|p| p.frame <= current);
        if start >= end {
            return &[];
        }
        &self.points[start..end]
    }

    /// Draw the trail ending at `current`; returns the number of points used
    ///
    /// Segments fade in with recency. The ball marker is drawn on the newest
    /// point only when it lies within `tolerance` frames of `current`.
    pub fn draw<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        current: u64,
        fps: f64,
        tolerance: u32,
        config: &BallTrailConfig,
    ) -> usize {
        let visible = self.window(current, window_frames(config.trail_window_s, fps));
        let Some(newest) = visible.last() else {
            return 0;
        };

        let segments = visible.len().saturating_sub(1);
        for (i, pair) in visible.windows(2).enumerate() {
            let recency = (i + 1) as f64 / segments as f64;
            canvas.draw(&DrawCommand::Line {
                from: pair[0].center,
                to: pair[1].center,
                color: TRAIL_COLOR.with_alpha(TAIL_ALPHA + (1.0 - TAIL_ALPHA) * recency),
                line_width: config.line_width,
            });
        }

        if newest.frame.abs_diff(current) <= u64::from(tolerance) {
            canvas.draw(&DrawCommand::FillCircle {
                center: newest.center,
                radius: config.marker_radius,
                color: TRAIL_COLOR,
            });
        }

        visible.len()
    }
}

/// Plausibility test against the previous accepted point
fn check_point(
    previous: Option<&TrailPoint>,
    point: &TrailPoint,
    fps: f64,
    config: &BallTrailConfig,
) -> Result<(), RejectReason> {
    if point.confidence.is_nan() || point.confidence < config.min_confidence {
        return Err(RejectReason::LowConfidence);
    }

    let Some(previous) = previous else {
        return Ok(());
    };

    let distance = point.center.distance(&previous.center);
    if distance > config.max_jump_px {
        return Err(RejectReason::Jump);
    }

    let elapsed = match (previous.timestamp, point.timestamp) {
        (Some(t0), Some(t1)) => t1 - t0,
        _ => (point.frame as f64 - previous.frame as f64) / fps,
    };
    // Same-instant duplicates carry no velocity information
    if elapsed > 0.0 && distance / elapsed > config.max_velocity_px_s {
        return Err(RejectReason::Velocity);
    }

    Ok(())
}
