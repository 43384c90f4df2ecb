//! Player and action box layers.

use contracts::{
    ActionEvent, ActionKind, BoundingBox, BoxStyleConfig, Canvas, DrawCommand, Point, PlayerTrack,
    Rgba, TrackId,
};

use crate::frame_lookup::nearest_frame;
use crate::jersey::JerseyResolver;

/// Player box outline (emerald-400)
pub const PLAYER_COLOR: Rgba = Rgba::opaque(0x34, 0xd3, 0x99);
/// Selected player outline (yellow-400)
pub const SELECTED_COLOR: Rgba = Rgba::opaque(0xfa, 0xcc, 0x15);
const LABEL_TEXT: Rgba = Rgba::WHITE;
const LABEL_BACKGROUND_ALPHA: f64 = 0.75;
const ACTION_LINE_WIDTH: f64 = 3.0;

/// Display colour of an action kind
pub fn action_color(kind: ActionKind) -> Rgba {
    let (r, g, b) = match kind {
        ActionKind::Spike => (0xef, 0x44, 0x44),
        ActionKind::Set => (0x3b, 0x82, 0xf6),
        ActionKind::Receive => (0x10, 0xb9, 0x81),
        ActionKind::Serve => (0xf5, 0x9e, 0x0b),
        ActionKind::Block => (0x8b, 0x5c, 0xf6),
        ActionKind::Unknown => (0x9c, 0xa3, 0xaf),
    };
    Rgba::opaque(r, g, b)
}

/// Counts from one layer pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerCounts {
    pub drawn: usize,
    pub skipped: usize,
}

fn draw_labelled_box<C: Canvas + ?Sized>(
    canvas: &mut C,
    rect: BoundingBox,
    color: Rgba,
    line_width: f64,
    text: String,
) {
    canvas.draw(&DrawCommand::StrokeRect {
        rect,
        color,
        line_width,
    });
    canvas.draw(&DrawCommand::Label {
        anchor: Point::new(rect.x1, rect.y1),
        text,
        color: LABEL_TEXT,
        background: color.with_alpha(LABEL_BACKGROUND_ALPHA),
    });
}

/// Boxes of the player detections nearest to `current`
///
/// Nothing is drawn when no frame lies within `tolerance`. Malformed boxes
/// are skipped and counted.
pub fn draw_player_boxes<C: Canvas + ?Sized>(
    canvas: &mut C,
    tracks: &[PlayerTrack],
    current: u64,
    tolerance: u32,
    jerseys: &JerseyResolver,
    selected: Option<TrackId>,
    style: &BoxStyleConfig,
) -> LayerCounts {
    let mut counts = LayerCounts::default();
    let Some(track) = nearest_frame(tracks, current, tolerance) else {
        return counts;
    };

    for player in &track.players {
        let Some(rect) = player.bounding_box() else {
            counts.skipped += 1;
            continue;
        };
        let (color, line_width) = if selected == Some(player.id) {
            (SELECTED_COLOR, style.selected_line_width)
        } else {
            (PLAYER_COLOR, style.line_width)
        };
        draw_labelled_box(canvas, rect, color, line_width, jerseys.label(player.id));
        counts.drawn += 1;
    }
    counts
}

/// Whether an action is on screen at `current`
///
/// Either its start frame is within `tolerance`, or `current` lies inside
/// its `[frame, end_frame]` span.
pub fn action_visible(action: &ActionEvent, current: u64, tolerance: u32) -> bool {
    if action.frame.abs_diff(current) <= u64::from(tolerance) {
        return true;
    }
    action
        .end_frame
        .is_some_and(|end| action.frame <= current && current <= end)
}

/// Label of an action box, e.g. `SPIKE #7`
pub fn action_label(action: &ActionEvent, jerseys: &JerseyResolver) -> String {
    let kind = action.action.as_str().to_uppercase();
    match action.player_id {
        Some(player_id) => format!("{kind} {}", jerseys.label(player_id)),
        None => kind,
    }
}

/// Boxes of every action visible at `current`
pub fn draw_action_boxes<C: Canvas + ?Sized>(
    canvas: &mut C,
    actions: &[ActionEvent],
    current: u64,
    tolerance: u32,
    jerseys: &JerseyResolver,
) -> LayerCounts {
    let mut counts = LayerCounts::default();
    for action in actions.iter().filter(|a| action_visible(a, current, tolerance)) {
        let Some(rect) = action.bounding_box() else {
            counts.skipped += 1;
            continue;
        };
        draw_labelled_box(
            canvas,
            rect,
            action_color(action.action),
            ACTION_LINE_WIDTH,
            action_label(action, jerseys),
        );
        counts.drawn += 1;
    }
    counts
}
