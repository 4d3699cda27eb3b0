use std::sync::Arc;

use kurbo::{Point, Shape, StrokeOpts};

use crate::assets::store::ImageData;
use crate::foundation::core::{Affine, BezPath, FrameBuffer, Rect};
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::foundation::math::{luminance, mul_div255_u8, unit_to_u8, unpremultiply_px};
use crate::render::blend::{CompositeOp, composite_rgba8_premul, scale_by_coverage};
use crate::render::filters::FilterChain;
use crate::render::paint::{Fill, GradientSampler, StrokeStyle};
use crate::render::raster::{RasterPaint, Rasterizer, asset_paint, image_paint};
use crate::scene::color::Color;
use crate::scene::style::MaskMode;

const STROKE_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone)]
struct PaintState {
    transform: Affine,
    opacity: f32,
    op: CompositeOp,
    /// Per-pixel clip coverage; `None` means unclipped.
    clip: Option<Arc<Vec<u8>>>,
}

impl Default for PaintState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            opacity: 1.0,
            op: CompositeOp::default(),
            clip: None,
        }
    }
}

/// Premultiplied RGBA8 pixel buffer with a save/restore paint state stack.
///
/// Paint state covers the current transform, running opacity, composite operator and clip.
/// Shapes are rasterized to coverage with `vello_cpu`; compositing runs on the bytes here.
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    state: PaintState,
    stack: Vec<PaintState>,
    raster: Rasterizer,
}

impl Surface {
    /// Transparent `width x height` surface (both in `1..=65535`).
    pub fn new(width: u32, height: u32) -> ScenecastResult<Self> {
        let raster = Rasterizer::new(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; FrameBuffer::byte_len(width, height)],
            state: PaintState::default(),
            stack: Vec::new(),
            raster,
        })
    }

    /// Same-size transparent layer that inherits the current transform only.
    pub fn new_layer(&self) -> ScenecastResult<Self> {
        let mut layer = Self::new(self.width, self.height)?;
        layer.state.transform = self.state.transform;
        Ok(layer)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at `(x, y)`; out-of-bounds reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Fill every pixel with `color`, or transparent when `None`. Paint state is untouched.
    pub fn clear(&mut self, color: Option<Color>) {
        match color {
            None => self.pixels.fill(0),
            Some(c) => {
                let px = c.to_rgba8_premul().to_array();
                for d in self.pixels.chunks_exact_mut(4) {
                    d.copy_from_slice(&px);
                }
            }
        }
    }

    /// Push the current paint state.
    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    /// Pop the last saved paint state; an unmatched restore does nothing.
    pub fn restore(&mut self) {
        match self.stack.pop() {
            Some(s) => self.state = s,
            None => tracing::debug!("surface restore without matching save ignored"),
        }
    }

    /// Number of saved states.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    /// Current user-to-device transform.
    pub fn transform(&self) -> Affine {
        self.state.transform
    }

    /// Translate user space.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.concat(Affine::translate((dx, dy)));
    }

    /// Translate in device space, after the current transform.
    pub fn translate_device(&mut self, dx: f64, dy: f64) {
        self.state.transform = Affine::translate((dx, dy)) * self.state.transform;
    }

    /// Pre-multiply `a` into the current transform (applied to user coordinates first).
    pub fn concat(&mut self, a: Affine) {
        self.state.transform *= a;
    }

    /// Running opacity.
    pub fn opacity(&self) -> f32 {
        self.state.opacity
    }

    /// Multiply the running opacity by `o` (clamped to `0..=1`).
    pub fn multiply_opacity(&mut self, o: f32) {
        let o = if o.is_finite() { o.clamp(0.0, 1.0) } else { 0.0 };
        self.state.opacity *= o;
    }

    /// Current composite operator.
    pub fn composite(&self) -> CompositeOp {
        self.state.op
    }

    /// Switch the composite operator.
    pub fn set_composite(&mut self, op: CompositeOp) {
        self.state.op = op;
    }

    /// Intersect the clip with `path` (in user space).
    pub fn clip_path(&mut self, path: &BezPath) {
        let scratch = self.raster.fill(
            path,
            self.state.transform,
            RasterPaint::Solid([255, 255, 255, 255]),
        );
        let mut coverage: Vec<u8> = scratch.chunks_exact(4).map(|px| px[3]).collect();
        if let Some(prev) = &self.state.clip {
            for (c, p) in coverage.iter_mut().zip(prev.iter()) {
                *c = mul_div255_u8(u16::from(*c), u16::from(*p));
            }
        }
        self.state.clip = Some(Arc::new(coverage));
    }

    /// Whether a clip is active.
    pub fn is_clipped(&self) -> bool {
        self.state.clip.is_some()
    }

    /// Fill `path` with a solid colour or gradient.
    pub fn fill_path(&mut self, path: &BezPath, fill: Fill<'_>) -> ScenecastResult<()> {
        match fill {
            Fill::Solid(color) => {
                if color.a <= 0.0 {
                    return Ok(());
                }
                let src = self.raster.fill(
                    path,
                    self.state.transform,
                    RasterPaint::Solid(color.to_rgba8()),
                );
                composite_into(&mut self.pixels, src, &self.state)
            }
            Fill::Gradient {
                gradient,
                width,
                height,
            } => {
                if !(width > 0.0 && height > 0.0) {
                    return Ok(());
                }
                let transform = self.state.transform;
                let Some(sampler) = GradientSampler::new(gradient, width, height) else {
                    return Ok(());
                };
                if !(transform.determinant().abs() > f64::EPSILON) {
                    return Ok(());
                }
                // Sampled per covered device pixel.
                let inverse = transform.inverse();
                let stride = self.width as usize;
                let src = self
                    .raster
                    .fill(path, transform, RasterPaint::Solid([255, 255, 255, 255]));
                for (i, px) in src.chunks_exact_mut(4).enumerate() {
                    let coverage = u16::from(px[3]);
                    if coverage == 0 {
                        continue;
                    }
                    let device = Point::new((i % stride) as f64 + 0.5, (i / stride) as f64 + 0.5);
                    let color = sampler.sample(inverse * device);
                    for (d, s) in px.iter_mut().zip(color) {
                        *d = mul_div255_u8(u16::from(s), coverage);
                    }
                }
                composite_into(&mut self.pixels, src, &self.state)
            }
        }
    }

    /// Stroke `path` with `color`: the stroke outline is built with `kurbo` and then filled.
    pub fn stroke_path(
        &mut self,
        path: &BezPath,
        style: &StrokeStyle,
        color: Color,
    ) -> ScenecastResult<()> {
        if !(style.width > 0.0) {
            return Ok(());
        }
        let outline = kurbo::stroke(
            path.iter(),
            &style.to_kurbo(),
            &StrokeOpts::default(),
            STROKE_TOLERANCE,
        );
        self.fill_path(&outline, Fill::Solid(color))
    }

    /// Draw `image` scaled into `dest` (user space).
    pub fn draw_image(&mut self, image: &ImageData, dest: Rect) -> ScenecastResult<()> {
        if dest.width() <= 0.0 || dest.height() <= 0.0 {
            return Ok(());
        }
        let (iw, ih) = (f64::from(image.width()), f64::from(image.height()));
        let paint = asset_paint(image)?;
        let tr = self.state.transform
            * Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(dest.width() / iw, dest.height() / ih);
        let src = self.raster.fill(
            &Rect::new(0.0, 0.0, iw, ih).to_path(STROKE_TOLERANCE),
            tr,
            RasterPaint::Image(&paint),
        );
        composite_into(&mut self.pixels, src, &self.state)
    }

    /// Draw `other` with its top-left at `at` (user space), under the current transform.
    pub fn draw_surface(&mut self, other: &Surface, at: Point) -> ScenecastResult<()> {
        let paint = image_paint(&other.pixels, other.width, other.height)?;
        let tr = self.state.transform * Affine::translate(at.to_vec2());
        let rect = Rect::new(0.0, 0.0, f64::from(other.width), f64::from(other.height));
        let src = self
            .raster
            .fill(&rect.to_path(STROKE_TOLERANCE), tr, RasterPaint::Image(&paint));
        composite_into(&mut self.pixels, src, &self.state)
    }

    /// Composite a same-size layer pixel-for-pixel with the current opacity, operator and clip.
    pub fn composite_layer(&mut self, layer: &Surface) -> ScenecastResult<()> {
        if layer.width != self.width || layer.height != self.height {
            return Err(ScenecastError::compositing(format!(
                "layer {}x{} does not match surface {}x{}",
                layer.width, layer.height, self.width, self.height
            )));
        }
        let mut src = layer.pixels.clone();
        composite_into(&mut self.pixels, &mut src, &self.state)
    }

    /// Run `chain` over the whole surface.
    pub fn apply_filters(&mut self, chain: &FilterChain) -> ScenecastResult<()> {
        chain.apply(&mut self.pixels, self.width, self.height)
    }

    /// Per-pixel mask coverage of this surface: alpha, or luminance scaled by alpha.
    ///
    /// Inverted modes yield the same coverage; inversion is the caller's choice of operator.
    pub fn mask_coverage(&self, mode: MaskMode) -> Vec<u8> {
        match mode {
            MaskMode::Luminance | MaskMode::LuminanceInverted => self
                .pixels
                .chunks_exact(4)
                .map(|px| {
                    let [r, g, b, a] = unpremultiply_px(px);
                    unit_to_u8(luminance(r, g, b) * a)
                })
                .collect(),
            MaskMode::Alpha | MaskMode::AlphaInverted | MaskMode::Unknown => {
                self.pixels.chunks_exact(4).map(|px| px[3]).collect()
            }
        }
    }

    /// Gate this surface by `coverage` with `destination-in` or `destination-out`.
    pub fn mask_with(&mut self, coverage: &[u8], op: CompositeOp) -> ScenecastResult<()> {
        if coverage.len() * 4 != self.pixels.len() {
            return Err(ScenecastError::compositing("mask coverage size mismatch"));
        }
        match op {
            CompositeOp::DestinationIn => scale_by_coverage(&mut self.pixels, coverage),
            CompositeOp::DestinationOut => {
                let inv: Vec<u8> = coverage.iter().map(|c| 255 - c).collect();
                scale_by_coverage(&mut self.pixels, &inv);
            }
            CompositeOp::Blend(_) => {
                return Err(ScenecastError::compositing(
                    "mask_with expects destination-in or destination-out",
                ));
            }
        }
        Ok(())
    }

    /// Consume the surface into a premultiplied frame.
    pub fn into_frame(self) -> FrameBuffer {
        FrameBuffer {
            width: self.width,
            height: self.height,
            data: self.pixels,
            premultiplied: true,
        }
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("transform", &self.state.transform)
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

fn composite_into(pixels: &mut [u8], src: &mut [u8], state: &PaintState) -> ScenecastResult<()> {
    if let Some(clip) = &state.clip {
        scale_by_coverage(src, clip);
    }
    composite_rgba8_premul(pixels, src, state.opacity, state.op)
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
