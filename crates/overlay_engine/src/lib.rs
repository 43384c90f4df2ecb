//! # Overlay Engine
//!
//! Time-synchronised drawing of video analysis overlays.
//!
//! Responsibilities:
//! - Map playback time to the nearest detection record within a tolerance
//! - Accumulate trailing windows (ball trail, movement heatmap)
//! - Filter implausible ball detections
//! - Resolve track ids to jersey labels
//! - Emit draw commands onto any `Canvas`
//!
//! ## Usage
//!
//! ```ignore
//! use overlay_engine::{OverlayRenderer, OverlayState};
//!
//! let renderer = OverlayRenderer::new(&results, OverlayConfig::default());
//! let state = OverlayState::new(OverlayVisibility::default());
//!
//! // On every redraw the clock lets through
//! if let Some(t) = clock.time_update(video_time) {
//!     renderer.render(&mut canvas, t, &state);
//! }
//! ```

mod ball_trail;
mod boxes;
mod frame_lookup;
mod heatmap;
mod jersey;
mod mapping;
mod playback;
mod renderer;
mod timeline;

pub use ball_trail::{BallTrail, RejectCounts, RejectReason, TrailPoint, TRAIL_COLOR};
pub use boxes::{
    action_color, action_label, action_visible, draw_action_boxes, draw_player_boxes,
    LayerCounts, PLAYER_COLOR, SELECTED_COLOR,
};
pub use frame_lookup::{current_frame, frames_in_window, nearest_frame, window_frames, FrameIndexed};
pub use heatmap::{Heatmap, HeatmapCell};
pub use hit_test::hit_test_player;
pub use jersey::{JerseyResolver, ResolvedName};
pub use mapping::DisplayMapping;
pub use playback::{PlaybackClock, ANIMATION_FRAME_THRESHOLD_S, TIME_UPDATE_THRESHOLD_S};
pub use renderer::{OverlayRenderer, OverlayState};
pub use timeline::{
    assign_rows, play_segments, seek_time, PlaySegment, TimelineLayout, TimelineMarker,
    MARKER_WIDTH_PERCENT,
};

// Re-export contracts types
pub use contracts::{OverlayConfig, OverlayVisibility, RenderStats, RenderedFrame};
