use std::sync::Arc;

use crate::assets::store::ImageData;
use crate::foundation::core::{Affine, BezPath};
use crate::foundation::error::{ScenecastError, ScenecastResult};

/// What a rasterized shape is filled with.
pub(crate) enum RasterPaint<'a> {
    /// Straight-alpha RGBA8 colour.
    Solid([u8; 4]),
    /// Premultiplied image sampled in the shape's user space, its top-left at the origin.
    Image(&'a vello_cpu::Image),
}

/// Owns a `vello_cpu` context plus a scratch pixmap the size of the surface.
///
/// Every call renders into the cleared scratch pixmap; callers composite the result themselves.
pub(crate) struct Rasterizer {
    ctx: vello_cpu::RenderContext,
    scratch: vello_cpu::Pixmap,
}

impl Rasterizer {
    pub(crate) fn new(width: u32, height: u32) -> ScenecastResult<Self> {
        let (w, h) = surface_dims_u16(width, height)?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            scratch: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Rasterize `path` under `transform` and return the premultiplied scratch pixels.
    pub(crate) fn fill(
        &mut self,
        path: &BezPath,
        transform: Affine,
        paint: RasterPaint<'_>,
    ) -> &mut [u8] {
        self.ctx.reset();
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        match paint {
            RasterPaint::Solid([r, g, b, a]) => {
                self.ctx
                    .set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            }
            RasterPaint::Image(img) => self.ctx.set_paint(img.clone()),
        }
        self.ctx.fill_path(&bezpath_to_cpu(path));
        self.finish()
    }

    fn finish(&mut self) -> &mut [u8] {
        self.ctx.flush();
        self.scratch.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.scratch);
        self.scratch.data_as_u8_slice_mut()
    }
}

pub(crate) fn surface_dims_u16(width: u32, height: u32) -> ScenecastResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(ScenecastError::compositing("surface width/height must be non-zero"));
    }
    let w: u16 = width.try_into().map_err(|_| {
        ScenecastError::compositing(format!("surface width {width} exceeds 65535"))
    })?;
    let h: u16 = height.try_into().map_err(|_| {
        ScenecastError::compositing(format!("surface height {height} exceeds 65535"))
    })?;
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Wrap premultiplied RGBA8 bytes as a `vello_cpu` pixmap.
pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ScenecastResult<vello_cpu::Pixmap> {
    let (w, h) = surface_dims_u16(width, height)?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(ScenecastError::compositing("pixmap byte len mismatch"));
    }
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

/// Image paint for premultiplied bytes.
pub(crate) fn image_paint(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ScenecastResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(paint_from_pixmap(Arc::new(pixmap)))
}

/// Image paint for a decoded asset, reusing the asset's cached pixmap.
pub(crate) fn asset_paint(image: &ImageData) -> ScenecastResult<vello_cpu::Image> {
    if let Some(pm) = image.pixmap.get() {
        return Ok(paint_from_pixmap(pm.clone()));
    }
    let pm = Arc::new(pixmap_from_premul_bytes(
        image.data(),
        image.width(),
        image.height(),
    )?);
    let pm = image.pixmap.get_or_init(|| pm).clone();
    Ok(paint_from_pixmap(pm))
}

fn paint_from_pixmap(pixmap: Arc<vello_cpu::Pixmap>) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(pixmap),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}
