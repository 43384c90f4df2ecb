//! Recency-weighted player movement heatmap.
//!
//! Player centres within the trailing window are bucketed into square grid
//! cells. Busy cells draw larger and more opaque; cells not visited for a
//! while fade, but never below the configured recency floor.

use std::collections::HashMap;

use contracts::{Canvas, DrawCommand, GradientStop, HeatmapConfig, Point, PlayerTrack, Rgba, TrackId};

use crate::frame_lookup::{frames_in_window, window_frames};

const INNER: Rgba = Rgba::opaque(255, 0, 0);
const MIDDLE: Rgba = Rgba::opaque(255, 100, 0);

/// One occupied grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapCell {
    /// Grid column / row (may be negative for off-frame boxes)
    pub grid_x: i64,
    pub grid_y: i64,
    /// Visits inside the window
    pub count: u32,
    /// Most recent frame that visited the cell
    pub last_frame: u64,
    /// Cell centre in source pixels
    pub center: Point,
    pub intensity: f64,
    pub alpha: f64,
    pub radius: f64,
}

/// Accumulated heatmap for one playback instant
#[derive(Debug, Clone, Default)]
pub struct Heatmap {
    cells: Vec<HeatmapCell>,
    skipped: usize,
}

impl Heatmap {
    /// Accumulate player positions in `[current - window, current]`
    ///
    /// `player_filter` restricts accumulation to one track id.
    pub fn accumulate(
        tracks: &[PlayerTrack],
        current: u64,
        fps: f64,
        player_filter: Option<TrackId>,
        config: &HeatmapConfig,
    ) -> Self {
        let cell_size = f64::from(config.cell_size_px.max(1));
        let window = window_frames(config.window_s, fps);

        // Insertion order decides paint order
        let mut index: HashMap<(i64, i64), usize> = HashMap::new();
        let mut visits: Vec<((i64, i64), u32, u64)> = Vec::new();
        let mut skipped = 0;

        for track in frames_in_window(tracks, current, window) {
            let frame = track.frame.unwrap_or_default();
            for player in &track.players {
                if player_filter.is_some_and(|id| id != player.id) {
                    continue;
                }
                let Some(bbox) = player.bounding_box() else {
                    skipped += 1;
                    continue;
                };
                let center = bbox.center();
                let key = (
                    (center.x.round() / cell_size).floor() as i64,
                    (center.y.round() / cell_size).floor() as i64,
                );
                match index.get(&key) {
                    Some(&slot) => {
                        let entry = &mut visits[slot];
                        entry.1 += 1;
                        entry.2 = entry.2.max(frame);
                    }
                    None => {
                        index.insert(key, visits.len());
                        visits.push((key, 1, frame));
                    }
                }
            }
        }

        let max_count = visits.iter().map(|v| v.1).max().unwrap_or(0);
        if max_count == 0 {
            return Self {
                cells: Vec::new(),
                skipped,
            };
        }

        // Recency decays over the unrounded window length
        let window_span = config.window_s * fps;
        let cells = visits
            .into_iter()
            .map(|((grid_x, grid_y), count, last_frame)| {
                let norm = f64::from(count) / f64::from(max_count);
                let intensity = 0.2 + 0.5 * norm;
                let age = current.saturating_sub(last_frame) as f64;
                let time_alpha = if window_span > 0.0 {
                    (1.0 - 0.6 * age / window_span).max(config.min_recency_alpha)
                } else {
                    1.0
                };
                HeatmapCell {
                    grid_x,
                    grid_y,
                    count,
                    last_frame,
                    center: Point::new(
                        grid_x as f64 * cell_size + cell_size / 2.0,
                        grid_y as f64 * cell_size + cell_size / 2.0,
                    ),
                    intensity,
                    alpha: intensity * time_alpha,
                    radius: 15.0 + 25.0 * norm,
                }
            })
            .collect();

        Self { cells, skipped }
    }

    pub fn cells(&self) -> &[HeatmapCell] {
        &self.cells
    }

    /// Player boxes skipped for malformed coordinates
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Paint every cell as a red → orange → transparent radial blob
    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C) {
        for cell in &self.cells {
            canvas.draw(&DrawCommand::RadialGradient {
                center: cell.center,
                radius: cell.radius,
                stops: vec![
                    GradientStop::new(0.0, INNER.with_alpha(cell.alpha)),
                    GradientStop::new(0.5, MIDDLE.with_alpha(cell.alpha * 0.8)),
                    GradientStop::new(1.0, INNER.with_alpha(0.0)),
                ],
            });
        }
    }
}
