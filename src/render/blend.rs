use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::foundation::math::{add_sat_u8, mul_div255_u8};
use crate::scene::style::BlendMode;

/// Operator used when a rasterized source is composited onto a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOp {
    /// Source-over with a blend function.
    Blend(BlendMode),
    /// Keep the destination where the source is opaque.
    DestinationIn,
    /// Keep the destination where the source is transparent.
    DestinationOut,
}

impl Default for CompositeOp {
    fn default() -> Self {
        Self::Blend(BlendMode::Normal)
    }
}

impl From<BlendMode> for CompositeOp {
    fn from(mode: BlendMode) -> Self {
        Self::Blend(mode)
    }
}

/// Composite premultiplied `src` onto premultiplied `dst` (equal-length RGBA8 buffers).
///
/// `opacity` scales the source before the operator is applied.
pub(crate) fn composite_rgba8_premul(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    op: CompositeOp,
) -> ScenecastResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ScenecastError::compositing(
            "composite expects equal-length rgba8 buffers",
        ));
    }

    // Dispatch once per call; each arm monomorphizes its own kernel.
    match op {
        CompositeOp::DestinationIn => {
            destination_alpha(dst, src, opacity, false);
            Ok(())
        }
        CompositeOp::DestinationOut => {
            destination_alpha(dst, src, opacity, true);
            Ok(())
        }
        CompositeOp::Blend(mode) => match mode {
            BlendMode::Normal | BlendMode::Unknown => {
                premul_over_in_place_opacity(dst, src, opacity);
                Ok(())
            }
            BlendMode::Plus => {
                plus_in_place_opacity(dst, src, opacity);
                Ok(())
            }
            BlendMode::Multiply => separable(dst, src, opacity, |s, d| s * d),
            BlendMode::Screen => separable(dst, src, opacity, |s, d| s + d - s * d),
            BlendMode::Overlay => separable(dst, src, opacity, |s, d| hard_light(d, s)),
            BlendMode::Darken => separable(dst, src, opacity, |s, d| s.min(d)),
            BlendMode::Lighten => separable(dst, src, opacity, |s, d| s.max(d)),
            BlendMode::ColorDodge => separable(dst, src, opacity, |s, d| {
                if d <= 0.0 {
                    0.0
                } else if s >= 1.0 {
                    1.0
                } else {
                    (d / (1.0 - s)).min(1.0)
                }
            }),
            BlendMode::ColorBurn => separable(dst, src, opacity, |s, d| {
                if d >= 1.0 {
                    1.0
                } else if s <= 0.0 {
                    0.0
                } else {
                    1.0 - ((1.0 - d) / s).min(1.0)
                }
            }),
            BlendMode::HardLight => separable(dst, src, opacity, hard_light),
            BlendMode::SoftLight => separable(dst, src, opacity, |s, d| {
                if s <= 0.5 {
                    d - (1.0 - 2.0 * s) * d * (1.0 - d)
                } else {
                    let g = if d <= 0.25 {
                        ((16.0 * d - 12.0) * d + 4.0) * d
                    } else {
                        d.sqrt()
                    };
                    d + (2.0 * s - 1.0) * (g - d)
                }
            }),
            BlendMode::Difference => separable(dst, src, opacity, |s, d| (d - s).abs()),
            BlendMode::Exclusion => separable(dst, src, opacity, |s, d| d + s - 2.0 * d * s),
            BlendMode::Hue => {
                non_separable(dst, src, opacity, |s, d| set_lum(set_sat(s, sat(d)), lum(d)))
            }
            BlendMode::Saturation => {
                non_separable(dst, src, opacity, |s, d| set_lum(set_sat(d, sat(s)), lum(d)))
            }
            BlendMode::Color => non_separable(dst, src, opacity, |s, d| set_lum(s, lum(d))),
            BlendMode::Luminosity => non_separable(dst, src, opacity, |s, d| set_lum(d, lum(s))),
        },
    }
}

fn opacity_u16(opacity: f32) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

pub(crate) fn premul_over_in_place_opacity(dst: &mut [u8], src: &[u8], opacity: f32) {
    let op = opacity_u16(opacity);
    if op == 0 {
        return;
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);

        d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = add_sat_u8(sc, dc);
        }
    }
}

fn plus_in_place_opacity(dst: &mut [u8], src: &[u8], opacity: f32) {
    let op = opacity_u16(opacity);
    if op == 0 {
        return;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        for c in 0..4 {
            d[c] = add_sat_u8(d[c], mul_div255_u8(u16::from(s[c]), op));
        }
    }
}

/// `destination-in` / `destination-out`: scale the destination by source alpha (or its inverse).
fn destination_alpha(dst: &mut [u8], src: &[u8], opacity: f32, invert: bool) {
    let op = opacity_u16(opacity);
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        let w = u16::from(if invert { 255 - sa } else { sa });
        for c in d.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w);
        }
    }
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

#[inline(always)]
fn separable<F>(dst: &mut [u8], src: &[u8], opacity: f32, f: F) -> ScenecastResult<()>
where
    F: Fn(f32, f32) -> f32,
{
    non_separable(dst, src, opacity, |s, d| {
        [f(s[0], d[0]), f(s[1], d[1]), f(s[2], d[2])]
    })
}

#[inline(always)]
fn non_separable<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F) -> ScenecastResult<()>
where
    F: Fn([f32; 3], [f32; 3]) -> [f32; 3],
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return Ok(());
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        // out_a = sa + da * (1 - sa)
        // out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
        let sa = (s[3] as f32 / 255.0) * opacity;
        if sa <= 0.0 {
            continue;
        }
        let da = d[3] as f32 / 255.0;
        let sp = [0, 1, 2].map(|c| (s[c] as f32 / 255.0) * opacity);
        let dp = [0, 1, 2].map(|c| d[c] as f32 / 255.0);

        let sc = sp.map(|v| (v / sa).clamp(0.0, 1.0));
        let dc = if da > 0.0 {
            dp.map(|v| (v / da).clamp(0.0, 1.0))
        } else {
            [0.0; 3]
        };
        let b = blend_fn(sc, dc);

        for c in 0..3 {
            let out = sp[c] * (1.0 - da) + dp[c] * (1.0 - sa) + b[c].clamp(0.0, 1.0) * sa * da;
            d[c] = (out.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
        let out_a = (sa + da * (1.0 - sa)).clamp(0.0, 1.0);
        d[3] = (out_a * 255.0).round() as u8;
    }

    Ok(())
}

fn lum(c: [f32; 3]) -> f32 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f32; 3]) -> [f32; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut out = c;
    if n < 0.0 && l - n > f32::EPSILON {
        out = out.map(|v| l + (v - l) * l / (l - n));
    }
    if x > 1.0 && x - l > f32::EPSILON {
        out = out.map(|v| l + (v - l) * (1.0 - l) / (x - l));
    }
    out
}

fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
    let d = l - lum(c);
    clip_color(c.map(|v| v + d))
}

fn sat(c: [f32; 3]) -> f32 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|a, b| c[*a].total_cmp(&c[*b]));
    let [lo, mid, hi] = idx;
    let mut out = [0.0; 3];
    if c[hi] > c[lo] {
        out[mid] = (c[mid] - c[lo]) * s / (c[hi] - c[lo]);
        out[hi] = s;
    }
    out
}

/// Multiply every premultiplied pixel of `dst` by the matching coverage byte.
pub(crate) fn scale_by_coverage(dst: &mut [u8], coverage: &[u8]) {
    for (d, &w) in dst.chunks_exact_mut(4).zip(coverage) {
        if w == 255 {
            continue;
        }
        let w16 = u16::from(w);
        for c in d.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w16);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
