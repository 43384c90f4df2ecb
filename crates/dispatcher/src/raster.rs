//! RasterCanvas - paints draw commands into an RGBA8 buffer.
//!
//! Straight-alpha source-over compositing onto a transparent background,
//! so exported frames can be laid over the video.

use std::collections::HashSet;

use contracts::{BoundingBox, Canvas, DrawCommand, GradientStop, Point, Rgba, VideoSize};
use image::RgbaImage;

/// Approximate advance of one label glyph
const GLYPH_WIDTH_PX: f64 = 7.0;
/// Label plate height
const LABEL_HEIGHT_PX: f64 = 16.0;
/// Horizontal padding on each side of the label text
const LABEL_PADDING_PX: f64 = 4.0;

/// Canvas backed by an [`RgbaImage`]
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    image: RgbaImage,
}

impl RasterCanvas {
    pub fn new(size: VideoSize) -> Self {
        Self {
            image: RgbaImage::new(size.width, size.height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Pixel at (x, y) as `[r, g, b, a]`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Paint a whole command list after a clear
    pub fn paint(&mut self, commands: &[DrawCommand]) {
        self.clear();
        for command in commands {
            self.draw(command);
        }
    }

    /// Composite `color` over the pixel at (x, y); out-of-bounds is ignored
    fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || color.a <= 0.0 {
            return;
        }
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        let Some(pixel) = self.image.get_pixel_mut_checked(x, y) else {
            return;
        };

        let src_a = color.a.clamp(0.0, 1.0);
        let dst_a = f64::from(pixel.0[3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            pixel.0 = [0, 0, 0, 0];
            return;
        }

        let src = [color.r, color.g, color.b];
        for (channel, src_c) in pixel.0.iter_mut().take(3).zip(src) {
            let c = (f64::from(src_c) * src_a + f64::from(*channel) * dst_a * (1.0 - src_a)) / out_a;
            *channel = to_byte(c);
        }
        pixel.0[3] = to_byte(out_a * 255.0);
    }

    /// Pixel index range whose centres fall inside [lo, hi)
    fn span(&self, lo: f64, hi: f64, limit: u32) -> std::ops::Range<i64> {
        if !(lo.is_finite() && hi.is_finite()) {
            return 0..0;
        }
        let start = (lo - 0.5).ceil().max(0.0);
        let end = (hi - 0.5).ceil().min(f64::from(limit));
        if end <= start {
            return 0..0;
        }
        start as i64..end as i64
    }

    fn fill_rect(&mut self, rect: &BoundingBox, color: Rgba) {
        let (x1, x2) = ordered(rect.x1, rect.x2);
        let (y1, y2) = ordered(rect.y1, rect.y2);
        let xs = self.span(x1, x2, self.image.width());
        for y in self.span(y1, y2, self.image.height()) {
            for x in xs.clone() {
                self.blend(x, y, color);
            }
        }
    }

    /// Outline centred on the rectangle edge
    fn stroke_rect(&mut self, rect: &BoundingBox, color: Rgba, line_width: f64) {
        let half = line_width.max(1.0) / 2.0;
        let (x1, x2) = ordered(rect.x1, rect.x2);
        let (y1, y2) = ordered(rect.y1, rect.y2);

        let inner_x = (x1 + half)..(x2 - half);
        let inner_y = (y1 + half)..(y2 - half);
        let xs = self.span(x1 - half, x2 + half, self.image.width());

        for y in self.span(y1 - half, y2 + half, self.image.height()) {
            let cy = y as f64 + 0.5;
            for x in xs.clone() {
                let cx = x as f64 + 0.5;
                if !(inner_x.contains(&cx) && inner_y.contains(&cy)) {
                    self.blend(x, y, color);
                }
            }
        }
    }

    /// Bresenham walk stamped with a square brush; each pixel blends once
    fn line(&mut self, from: Point, to: Point, color: Rgba, line_width: f64) {
        if !(from.is_finite() && to.is_finite()) {
            return;
        }
        // Wider brushes than the canvas cover it anyway
        let max_brush = i64::from(self.image.width().max(self.image.height())) + 2;
        let brush = (line_width.max(1.0).min(max_brush as f64).round() as i64).max(1);
        let reach_lo = (brush - 1) / 2;
        let reach_hi = brush / 2;

        // Only the part of the segment the brush can paint from
        let margin = (brush + 1) as f64;
        let Some((from, to)) = clip_segment(
            from,
            to,
            Point::new(-margin, -margin),
            Point::new(
                f64::from(self.image.width()) + margin,
                f64::from(self.image.height()) + margin,
            ),
        ) else {
            return;
        };

        let (mut x0, mut y0) = (from.x.floor() as i64, from.y.floor() as i64);
        let (x1, y1) = (to.x.floor() as i64, to.y.floor() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let mut covered = HashSet::new();
        loop {
            for oy in -reach_lo..=reach_hi {
                for ox in -reach_lo..=reach_hi {
                    covered.insert((x0 + ox, y0 + oy));
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }

        for (x, y) in covered {
            self.blend(x, y, color);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba) {
        self.for_each_in_disc(center, radius, |_| Some(color));
    }

    fn radial_gradient(&mut self, center: Point, radius: f64, stops: &[GradientStop]) {
        if stops.is_empty() {
            return;
        }
        let mut sorted = stops.to_vec();
        sorted.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        self.for_each_in_disc(center, radius, |t| Some(gradient_color(&sorted, t)));
    }

    /// Plate above `anchor`, sized by the text length
    fn label(&mut self, anchor: Point, text: &str, background: Rgba) {
        let width = text.chars().count() as f64 * GLYPH_WIDTH_PX + 2.0 * LABEL_PADDING_PX;
        let plate = BoundingBox::new(anchor.x, anchor.y - LABEL_HEIGHT_PX, anchor.x + width, anchor.y);
        self.fill_rect(&plate, background);
    }

    /// Visit pixels whose centres lie inside the disc; `shade` gets the
    /// normalised distance from the centre
    fn for_each_in_disc(&mut self, center: Point, radius: f64, shade: impl Fn(f64) -> Option<Rgba>) {
        if !center.is_finite() || radius.is_nan() || radius <= 0.0 {
            return;
        }
        let xs = self.span(center.x - radius, center.x + radius, self.image.width());
        let ys = self.span(center.y - radius, center.y + radius, self.image.height());
        for y in ys {
            let cy = y as f64 + 0.5;
            for x in xs.clone() {
                let cx = x as f64 + 0.5;
                let dist = Point::new(cx, cy).distance(&center);
                if dist <= radius {
                    if let Some(color) = shade(dist / radius) {
                        self.blend(x, y, color);
                    }
                }
            }
        }
    }
}

impl Canvas for RasterCanvas {
    fn size(&self) -> VideoSize {
        VideoSize::new(self.image.width(), self.image.height())
    }

    fn resize(&mut self, size: VideoSize) {
        self.image = RgbaImage::new(size.width, size.height);
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            pixel.0 = [0, 0, 0, 0];
        }
    }

    fn draw(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::StrokeRect {
                rect,
                color,
                line_width,
            } => self.stroke_rect(rect, *color, *line_width),
            DrawCommand::FillRect { rect, color } => self.fill_rect(rect, *color),
            DrawCommand::Line {
                from,
                to,
                color,
                line_width,
            } => self.line(*from, *to, *color, *line_width),
            DrawCommand::FillCircle {
                center,
                radius,
                color,
            } => self.fill_circle(*center, *radius, *color),
            DrawCommand::RadialGradient {
                center,
                radius,
                stops,
            } => self.radial_gradient(*center, *radius, stops),
            DrawCommand::Label {
                anchor, text, background, ..
            } => self.label(*anchor, text, *background),
        }
    }
}

/// Colour at `t` (0-1) between sorted stops
fn gradient_color(stops: &[GradientStop], t: f64) -> Rgba {
    let first = stops[0];
    if t <= first.offset {
        return first.color;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let f = if span > 0.0 { (t - a.offset) / span } else { 1.0 };
            return Rgba::new(
                lerp_u8(a.color.r, b.color.r, f),
                lerp_u8(a.color.g, b.color.g, f),
                lerp_u8(a.color.b, b.color.b, f),
                a.color.a + (b.color.a - a.color.a) * f,
            );
        }
    }
    stops[stops.len() - 1].color
}

const OUT_LEFT: u8 = 1;
const OUT_RIGHT: u8 = 2;
const OUT_TOP: u8 = 4;
const OUT_BOTTOM: u8 = 8;

/// Cohen-Sutherland clip of a segment to the box `min..=max`
///
/// Clipped ends are pinned exactly onto the box edge, so a far-away
/// endpoint never loses precision on the axis it was clipped on.
fn clip_segment(mut a: Point, mut b: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    let outcode = |p: Point| {
        let mut code = 0;
        if p.x < min.x {
            code |= OUT_LEFT;
        } else if p.x > max.x {
            code |= OUT_RIGHT;
        }
        if p.y < min.y {
            code |= OUT_TOP;
        } else if p.y > max.y {
            code |= OUT_BOTTOM;
        }
        code
    };

    for _ in 0..8 {
        let (code_a, code_b) = (outcode(a), outcode(b));
        if code_a | code_b == 0 {
            return Some((a, b));
        }
        if code_a & code_b != 0 {
            return None;
        }
        if code_a != 0 {
            a = pin_to_edge(a, b, code_a, min, max)?;
        } else {
            b = pin_to_edge(b, a, code_b, min, max)?;
        }
    }
    None
}

/// Slide `p` towards `other` until it lies on the first edge in `code`
fn pin_to_edge(p: Point, other: Point, code: u8, min: Point, max: Point) -> Option<Point> {
    let pinned = if code & (OUT_LEFT | OUT_RIGHT) != 0 {
        let x = if code & OUT_LEFT != 0 { min.x } else { max.x };
        let t = (x - p.x) / (other.x - p.x);
        Point::new(x, p.y + (other.y - p.y) * t)
    } else {
        let y = if code & OUT_TOP != 0 { min.y } else { max.y };
        let t = (y - p.y) / (other.y - p.y);
        Point::new(p.x + (other.x - p.x) * t, y)
    };
    pinned.is_finite().then_some(pinned)
}

fn lerp_u8(a: u8, b: u8, f: f64) -> u8 {
    to_byte(f64::from(a) + (f64::from(b) - f64::from(a)) * f)
}

fn to_byte(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
