use smallvec::SmallVec;

use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::foundation::math::{luminance, unit_to_u8, unpremultiply_px};
use crate::scene::style::StyleConfig;

/// One pixel filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    /// Gaussian blur with this standard deviation in pixels.
    Blur(f32),
    /// Channel multiplier (1 = unchanged).
    Brightness(f32),
    /// Contrast around mid-grey (1 = unchanged).
    Contrast(f32),
    /// Mix towards luminance grey, `0..=1`.
    Grayscale(f32),
    /// Saturation factor (1 = unchanged, 0 = grey).
    Saturate(f32),
    /// Mix towards the inverted colour, `0..=1`.
    Invert(f32),
    /// Mix towards the sepia tone, `0..=1`.
    Sepia(f32),
}

/// Ordered filter list built from a node style.
///
/// The order is fixed: blur, brightness, contrast, grayscale, saturation, invert, sepia. Only
/// fields present on the style contribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    filters: SmallVec<[Filter; 4]>,
}

impl FilterChain {
    /// Chain for the filter fields present on `style`.
    pub fn from_style(style: &StyleConfig) -> Self {
        let mut filters = SmallVec::new();
        let finite = |v: Option<f32>| v.filter(|v| v.is_finite());
        if let Some(v) = finite(style.blur) {
            filters.push(Filter::Blur(v.max(0.0)));
        }
        if let Some(v) = finite(style.brightness) {
            filters.push(Filter::Brightness(v.max(0.0)));
        }
        if let Some(v) = finite(style.contrast) {
            filters.push(Filter::Contrast(v.max(0.0)));
        }
        if let Some(v) = finite(style.grayscale) {
            filters.push(Filter::Grayscale(v.clamp(0.0, 1.0)));
        }
        if let Some(v) = finite(style.saturation) {
            filters.push(Filter::Saturate(v.max(0.0)));
        }
        if let Some(v) = finite(style.invert) {
            filters.push(Filter::Invert(v.clamp(0.0, 1.0)));
        }
        if let Some(v) = finite(style.sepia) {
            filters.push(Filter::Sepia(v.clamp(0.0, 1.0)));
        }
        Self { filters }
    }

    /// Build a chain from explicit filters, kept in the given order.
    pub fn from_filters(filters: impl IntoIterator<Item = Filter>) -> Self {
        Self {
            filters: filters.into_iter().collect(),
        }
    }

    /// No filters present.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filters in application order.
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    /// Apply every filter in order to a premultiplied RGBA8 buffer.
    pub fn apply(&self, pixels: &mut [u8], width: u32, height: u32) -> ScenecastResult<()> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(ScenecastError::compositing("filter buffer size mismatch"));
        }
        for f in &self.filters {
            match *f {
                Filter::Blur(sigma) => blur_rgba8_premul(pixels, width, height, sigma)?,
                Filter::Brightness(b) => map_straight(pixels, |c| c.map(|v| v * b)),
                Filter::Contrast(k) => map_straight(pixels, |c| c.map(|v| (v - 0.5) * k + 0.5)),
                Filter::Grayscale(g) => map_straight(pixels, |c| {
                    let l = luminance(c[0], c[1], c[2]);
                    c.map(|v| v * (1.0 - g) + l * g)
                }),
                Filter::Saturate(s) => map_straight(pixels, |c| {
                    let l = luminance(c[0], c[1], c[2]);
                    c.map(|v| l * (1.0 - s) + v * s)
                }),
                Filter::Invert(i) => {
                    map_straight(pixels, |c| c.map(|v| v * (1.0 - i) + (1.0 - v) * i))
                }
                Filter::Sepia(s) => map_straight(pixels, |[r, g, b]| {
                    let sr = r * 0.393 + g * 0.769 + b * 0.189;
                    let sg = r * 0.349 + g * 0.686 + b * 0.168;
                    let sb = r * 0.272 + g * 0.534 + b * 0.131;
                    [
                        r * (1.0 - s) + sr * s,
                        g * (1.0 - s) + sg * s,
                        b * (1.0 - s) + sb * s,
                    ]
                }),
            }
        }
        Ok(())
    }
}

/// Run `f` on straight-alpha colour; alpha is preserved and fully transparent pixels are skipped.
fn map_straight(pixels: &mut [u8], f: impl Fn([f32; 3]) -> [f32; 3]) {
    for px in pixels.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let [r, g, b, a] = unpremultiply_px(px);
        let out = f([r, g, b]);
        for c in 0..3 {
            px[c] = unit_to_u8(out[c].clamp(0.0, 1.0) * a);
        }
    }
}

pub(crate) fn blur_rgba8_premul(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> ScenecastResult<()> {
    if !(sigma > 0.0) || width == 0 || height == 0 {
        return Ok(());
    }
    let sigma = sigma.min(f32::MAX);
    // Taps past the buffer extent only re-read clamped edge pixels.
    let radius = (f64::from(sigma) * 3.0)
        .ceil()
        .min(f64::from(width.max(height))) as u32;
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    if kernel.len() == 1 {
        return Ok(());
    }
    let mut tmp = vec![0u8; pixels.len()];
    horizontal_blur_q16(pixels, &mut tmp, width, height, &kernel);
    vertical_blur_q16(&tmp, pixels, width, height, &kernel);
    Ok(())
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ScenecastResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ScenecastError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(ScenecastError::compositing("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Keep the kernel summing to exactly 1.0 so flat regions stay flat.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/filters.rs"]
mod tests;
