//! Overlay engine configuration contracts that can be shared across crates.
//!
//! The thresholds are empirical: they are exposed as configuration, with
//! the defaults the viewer has always used.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::DEFAULT_FPS;

/// Overlay engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OverlayConfig {
    /// Max frame distance for a detection to count as "current"
    #[validate(range(max = 600))]
    pub frame_tolerance: u32,

    /// Frame rate used when the analysis reports none
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub default_fps: f64,

    /// Box style
    #[validate(nested)]
    pub boxes: BoxStyleConfig,

    /// Ball trajectory trail
    #[validate(nested)]
    pub ball: BallTrailConfig,

    /// Movement heatmap
    #[validate(nested)]
    pub heatmap: HeatmapConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            frame_tolerance: 15,
            default_fps: DEFAULT_FPS,
            boxes: BoxStyleConfig::default(),
            ball: BallTrailConfig::default(),
            heatmap: HeatmapConfig::default(),
        }
    }
}

/// Player/action box style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BoxStyleConfig {
    /// Outline width in source pixels
    #[validate(range(exclusive_min = 0.0, max = 50.0))]
    pub line_width: f64,
    /// Outline width of the selected player
    #[validate(range(exclusive_min = 0.0, max = 50.0))]
    pub selected_line_width: f64,
}

impl Default for BoxStyleConfig {
    fn default() -> Self {
        Self {
            line_width: 2.0,
            selected_line_width: 4.0,
        }
    }
}

/// Ball trail outlier filter and drawing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BallTrailConfig {
    /// Points below this confidence are dropped (boundary kept)
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_confidence: f64,
    /// Max jump from the previous accepted point, pixels (boundary kept)
    #[validate(range(exclusive_min = 0.0))]
    pub max_jump_px: f64,
    /// Max implied speed from the previous accepted point, px/s (boundary kept)
    #[validate(range(exclusive_min = 0.0))]
    pub max_velocity_px_s: f64,
    /// Trailing history shown, seconds
    #[validate(range(exclusive_min = 0.0, max = 600.0))]
    pub trail_window_s: f64,
    /// Trail stroke width
    #[validate(range(exclusive_min = 0.0, max = 50.0))]
    pub line_width: f64,
    /// Radius of the current-ball marker
    #[validate(range(exclusive_min = 0.0, max = 100.0))]
    pub marker_radius: f64,
}

impl Default for BallTrailConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.2,
            max_jump_px: 200.0,
            max_velocity_px_s: 1000.0,
            trail_window_s: 2.0,
            line_width: 3.0,
            marker_radius: 6.0,
        }
    }
}

/// Recency-weighted density map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HeatmapConfig {
    /// Grid cell edge, pixels
    #[validate(range(min = 1, max = 1000))]
    pub cell_size_px: u32,
    /// Trailing history accumulated, seconds
    #[validate(range(exclusive_min = 0.0, max = 3600.0))]
    pub window_s: f64,
    /// Lowest recency factor a visited cell decays to
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_recency_alpha: f64,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            cell_size_px: 20,
            window_s: 10.0,
            min_recency_alpha: 0.4,
        }
    }
}

/// User-toggled overlay visibility, owned by the containing view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayVisibility {
    pub player_boxes: bool,
    pub action_boxes: bool,
    pub ball_trail: bool,
    pub heatmap: bool,
}

impl Default for OverlayVisibility {
    fn default() -> Self {
        Self {
            player_boxes: true,
            action_boxes: true,
            ball_trail: true,
            heatmap: false,
        }
    }
}

impl OverlayVisibility {
    /// Everything on
    pub fn all() -> Self {
        Self {
            player_boxes: true,
            action_boxes: true,
            ball_trail: true,
            heatmap: true,
        }
    }

    /// Everything off
    pub fn none() -> Self {
        Self {
            player_boxes: false,
            action_boxes: false,
            ball_trail: false,
            heatmap: false,
        }
    }

    pub fn any(&self) -> bool {
        self.player_boxes || self.action_boxes || self.ball_trail || self.heatmap
    }
}
