use kurbo::{Cap, Join, Point, Stroke, Vec2};

use crate::foundation::math::unit_to_u8;
use crate::scene::color::Color;
use crate::scene::style::{Gradient, GradientKind, LineCap, LineJoin, StyleConfig};

/// Paint source for [`Surface::fill_path`](crate::render::surface::Surface::fill_path).
#[derive(Debug, Clone, Copy)]
pub enum Fill<'a> {
    /// Uniform colour.
    Solid(Color),
    /// Gradient spanning a `width x height` box whose top-left is the user-space origin.
    Gradient {
        /// Gradient definition.
        gradient: &'a Gradient,
        /// Box width.
        width: f64,
        /// Box height.
        height: f64,
    },
}

/// Stroke geometry: width, caps, joins and dashes.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// Line width in user-space units.
    pub width: f64,
    /// End caps.
    pub cap: LineCap,
    /// Corner joins.
    pub join: LineJoin,
    /// Dash pattern; empty for a solid line.
    pub dash: Vec<f64>,
    /// Offset into the dash pattern.
    pub dash_offset: f64,
}

impl StrokeStyle {
    /// Solid stroke of `width` with butt caps and miter joins.
    pub fn new(width: f64) -> Self {
        Self {
            width,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            dash: Vec::new(),
            dash_offset: 0.0,
        }
    }

    /// Path stroke from `strokeWidth` (default 1), caps, joins and dashes.
    pub fn from_style(style: &StyleConfig) -> Self {
        let width = style
            .stroke_width
            .filter(|w| w.is_finite())
            .map_or(1.0, |w| f64::from(w.max(0.0)));
        let dash: Vec<f64> = style
            .stroke_dash_array
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|d| f64::from(d.max(0.0)))
            .collect();
        Self {
            width,
            cap: style.stroke_line_cap.unwrap_or_default(),
            join: style.stroke_line_join.unwrap_or_default(),
            // An all-zero pattern would never advance.
            dash: if dash.iter().any(|d| *d > 0.0) { dash } else { Vec::new() },
            dash_offset: f64::from(style.stroke_dash_offset.unwrap_or(0.0)),
        }
    }

    pub(crate) fn to_kurbo(&self) -> Stroke {
        let cap = match self.cap {
            LineCap::Round => Cap::Round,
            LineCap::Square => Cap::Square,
            LineCap::Butt | LineCap::Unknown => Cap::Butt,
        };
        let join = match self.join {
            LineJoin::Round => Join::Round,
            LineJoin::Bevel => Join::Bevel,
            LineJoin::Miter | LineJoin::Unknown => Join::Miter,
        };
        let stroke = Stroke::new(self.width).with_caps(cap).with_join(join);
        if self.dash.is_empty() {
            stroke
        } else {
            stroke.with_dashes(self.dash_offset, self.dash.iter().copied())
        }
    }
}

/// Evaluates a gradient at user-space points of a `w x h` box whose top-left is the origin.
///
/// Linear gradients default to 180 degrees (top to bottom). Axis-aligned angles run between
/// pixel centers so both end colours are reached exactly. Radial gradients start at the box
/// center with radius `max(w, h) / 1.2`.
#[derive(Debug, Clone)]
pub(crate) struct GradientSampler {
    stops: Vec<(f32, [f32; 4])>,
    axis: GradientAxis,
}

#[derive(Debug, Clone, Copy)]
enum GradientAxis {
    Radial { center: Point, radius: f64 },
    Linear { start: Point, dir: Vec2, len2: f64 },
}

impl GradientSampler {
    /// `None` when the gradient has no colours.
    pub(crate) fn new(g: &Gradient, w: f64, h: f64) -> Option<Self> {
        let stops = resolved_stops(g);
        if stops.is_empty() {
            return None;
        }
        let axis = match g.kind {
            GradientKind::Radial => GradientAxis::Radial {
                center: Point::new(w / 2.0, h / 2.0),
                radius: (w.max(h) / 1.2).max(f64::EPSILON),
            },
            GradientKind::Linear | GradientKind::Unknown => {
                let (start, end) = linear_endpoints(f64::from(g.angle.unwrap_or(180.0)), w, h);
                let dir = end - start;
                GradientAxis::Linear {
                    start,
                    dir,
                    len2: dir.hypot2().max(f64::EPSILON),
                }
            }
        };
        Some(Self { stops, axis })
    }

    /// Premultiplied RGBA8 at `p`.
    pub(crate) fn sample(&self, p: Point) -> [u8; 4] {
        let t = match self.axis {
            GradientAxis::Radial { center, radius } => p.distance(center) / radius,
            GradientAxis::Linear { start, dir, len2 } => (p - start).dot(dir) / len2,
        };
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let [r, g, b, a] = sample_stops(&self.stops, t as f32);
        [
            unit_to_u8(r * a),
            unit_to_u8(g * a),
            unit_to_u8(b * a),
            unit_to_u8(a),
        ]
    }
}

fn linear_endpoints(angle: f64, w: f64, h: f64) -> (Point, Point) {
    let angle = angle.rem_euclid(360.0);
    if angle == 90.0 {
        (Point::new(0.5, h / 2.0), Point::new(w - 0.5, h / 2.0))
    } else if angle == 180.0 {
        (Point::new(w / 2.0, 0.5), Point::new(w / 2.0, h - 0.5))
    } else if angle == 270.0 {
        (Point::new(w - 0.5, h / 2.0), Point::new(0.5, h / 2.0))
    } else if angle == 0.0 {
        (Point::new(w / 2.0, h - 0.5), Point::new(w / 2.0, 0.5))
    } else {
        let (sin, cos) = (angle - 90.0).to_radians().sin_cos();
        let half = (w * cos.abs() + h * sin.abs()) / 2.0;
        let (cx, cy) = (w / 2.0, h / 2.0);
        (
            Point::new(cx - cos * half, cy - sin * half),
            Point::new(cx + cos * half, cy + sin * half),
        )
    }
}

fn resolved_stops(g: &Gradient) -> Vec<(f32, [f32; 4])> {
    let n = g.colors.len();
    let mut stops: Vec<(f32, [f32; 4])> = g
        .colors
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let even = i as f32 / (n as f32 - 1.0).max(1.0);
            let pos = g
                .stops
                .as_ref()
                .and_then(|s| s.get(i).copied())
                .filter(|p| p.is_finite())
                .unwrap_or(even);
            (pos.clamp(0.0, 1.0), c.to_f32_array())
        })
        .collect();
    stops.sort_by(|a, b| a.0.total_cmp(&b.0));
    stops
}

fn sample_stops(stops: &[(f32, [f32; 4])], t: f32) -> [f32; 4] {
    let (first, last) = (stops[0], stops[stops.len() - 1]);
    if t <= first.0 {
        return first.1;
    }
    if t >= last.0 {
        return last.1;
    }
    for pair in stops.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if t <= p1 {
            let span = p1 - p0;
            let k = if span > 0.0 { (t - p0) / span } else { 1.0 };
            return [0, 1, 2, 3].map(|i| c0[i] + (c1[i] - c0[i]) * k);
        }
    }
    last.1
}
