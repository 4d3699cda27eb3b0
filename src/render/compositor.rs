use kurbo::{Ellipse, RoundedRect, RoundedRectRadii, Shape};
use tracing::debug;

use crate::assets::RenderResources;
use crate::assets::store::ImageData;
use crate::assets::text::layout_lines;
use crate::foundation::core::{Affine, BezPath, FrameIndex, Point, Rect};
use crate::foundation::error::ScenecastResult;
use crate::layout::LayoutTree;
use crate::render::blend::CompositeOp;
use crate::render::filters::{Filter, FilterChain};
use crate::render::paint::{Fill, StrokeStyle};
use crate::render::surface::Surface;
use crate::scene::color::Color;
use crate::scene::model::{NodeKind, SceneNode};
use crate::scene::style::{BlendMode, Display, MaskMode, ObjectFit, StyleConfig, TextAlign};

const PATH_TOLERANCE: f64 = 0.1;

/// Paints scene trees onto surfaces.
///
/// Holds only read-only provider handles, so one compositor can paint any number of frames.
#[derive(Debug, Clone)]
pub struct Compositor {
    resources: RenderResources,
}

impl Compositor {
    /// Compositor reading assets, frames and glyphs from `resources`.
    pub fn new(resources: RenderResources) -> Self {
        Self { resources }
    }

    /// Provider handles used by this compositor.
    pub fn resources(&self) -> &RenderResources {
        &self.resources
    }

    /// Paint `node` (laid out as `layout`) onto `target` under its current paint state.
    ///
    /// `frame` is only used for video frame lookups. A layout tree whose shape differs from the
    /// scene is rejected before anything is drawn.
    pub fn paint(
        &self,
        node: &SceneNode,
        layout: &LayoutTree,
        target: &mut Surface,
        frame: FrameIndex,
    ) -> ScenecastResult<()> {
        layout.check_topology(node)?;
        let depth = target.save_depth();
        let out = self.paint_node(node, layout, target, frame);
        // Unwind any states left behind by an early error.
        while target.save_depth() > depth {
            target.restore();
        }
        out
    }

    fn paint_node(
        &self,
        node: &SceneNode,
        layout: &LayoutTree,
        target: &mut Surface,
        frame: FrameIndex,
    ) -> ScenecastResult<()> {
        if let NodeKind::Unknown(tag) = &node.kind {
            debug!(tag = %tag, "skipping node with unknown tag");
            return Ok(());
        }
        if node.style.display == Some(Display::None) {
            return Ok(());
        }

        let style = &node.style;
        let bx = layout.bx;
        let (w, h) = (f64::from(bx.width.max(0.0)), f64::from(bx.height.max(0.0)));

        target.save();
        target.multiply_opacity(style.opacity());
        target.translate(f64::from(bx.x), f64::from(bx.y));
        if style.has_transform() {
            target.concat(pivot_transform(style, w, h));
        }
        if let Some(mode) = style.blend_mode
            && mode != BlendMode::Unknown
        {
            target.set_composite(mode.into());
        }

        let filters = FilterChain::from_style(style);
        let out = if filters.is_empty() {
            self.paint_masked(node, layout, target, frame)
        } else {
            self.paint_filtered(node, layout, target, frame, &filters)
        };
        target.restore();
        out
    }

    fn paint_filtered(
        &self,
        node: &SceneNode,
        layout: &LayoutTree,
        target: &mut Surface,
        frame: FrameIndex,
        filters: &FilterChain,
    ) -> ScenecastResult<()> {
        let mut layer = target.new_layer()?;
        self.paint_masked(node, layout, &mut layer, frame)?;
        layer.apply_filters(filters)?;
        target.composite_layer(&layer)
    }

    fn paint_masked(
        &self,
        node: &SceneNode,
        layout: &LayoutTree,
        canvas: &mut Surface,
        frame: FrameIndex,
    ) -> ScenecastResult<()> {
        let Some(mask) = node.mask.as_deref() else {
            return self.paint_content(node, layout, canvas, frame);
        };

        let (bw, bh) = (layout.bx.width, layout.bx.height);
        if !(bw >= 0.5 && bh >= 0.5) {
            return Ok(());
        }
        let (pw, ph) = (bw.ceil() as u32, bh.ceil() as u32);

        let mut content = Surface::new(pw, ph)?;
        self.paint_content(node, layout, &mut content, frame)?;

        let mut mask_surface = Surface::new(pw, ph)?;
        let mask_layout = self.resources.layout.compute_layout(mask, bw, bh)?;
        self.paint(mask, &mask_layout, &mut mask_surface, frame)?;

        let mode = node.style.mask_mode();
        let coverage = mask_surface.mask_coverage(mode);
        let op = match mode {
            MaskMode::AlphaInverted | MaskMode::LuminanceInverted => CompositeOp::DestinationOut,
            MaskMode::Alpha | MaskMode::Luminance | MaskMode::Unknown => CompositeOp::DestinationIn,
        };
        content.mask_with(&coverage, op)?;
        canvas.draw_surface(&content, Point::ZERO)
    }

    fn paint_content(
        &self,
        node: &SceneNode,
        layout: &LayoutTree,
        canvas: &mut Surface,
        frame: FrameIndex,
    ) -> ScenecastResult<()> {
        let style = &node.style;
        let (w, h) = (
            f64::from(layout.bx.width.max(0.0)),
            f64::from(layout.bx.height.max(0.0)),
        );

        if style.clips() {
            canvas.clip_path(&rounded_box(style, w, h));
        }

        let shape = node_shape(node, w, h);
        self.paint_shadow(style, &shape, canvas)?;
        paint_box(style, &shape, canvas, w, h)?;

        match &node.kind {
            NodeKind::Text { text } => self.paint_text(style, text, canvas, w)?,
            NodeKind::Image { src } => match self.resources.assets.image(src) {
                Some(img) => draw_fitted(canvas, &img, style.object_fit, w, h)?,
                None => debug!(src = %src, "image asset missing; drawing nothing"),
            },
            NodeKind::Video { src } => match self.resources.frames.frame(src, frame) {
                Some(img) => draw_fitted(canvas, &img, style.object_fit, w, h)?,
                None => debug!(src = %src, frame = frame.0, "video frame missing; drawing nothing"),
            },
            NodeKind::Path { d } => paint_path(style, d, canvas)?,
            NodeKind::View
            | NodeKind::Rect
            | NodeKind::Circle
            | NodeKind::Ellipse
            | NodeKind::Unknown(_) => {}
        }

        // Stable: equal zIndex keeps declaration order.
        let mut order: Vec<usize> = (0..node.children.len()).collect();
        order.sort_by_key(|&i| node.children[i].style.z_index());
        for i in order {
            self.paint_node(&node.children[i], &layout.children[i], canvas, frame)?;
        }
        Ok(())
    }

    fn paint_shadow(
        &self,
        style: &StyleConfig,
        shape: &BezPath,
        canvas: &mut Surface,
    ) -> ScenecastResult<()> {
        let Some(color) = style.shadow_color.filter(|c| c.a > 0.0) else {
            return Ok(());
        };
        let mut layer = canvas.new_layer()?;
        // The offset ignores the node's rotation and scale.
        layer.translate_device(
            f64::from(style.shadow_offset_x.unwrap_or(0.0)),
            f64::from(style.shadow_offset_y.unwrap_or(0.0)),
        );
        layer.fill_path(shape, Fill::Solid(color))?;
        let blur = style.shadow_blur.filter(|b| b.is_finite()).unwrap_or(0.0);
        if blur > 0.0 {
            layer.apply_filters(&FilterChain::from_filters([Filter::Blur(blur / 2.0)]))?;
        }
        canvas.composite_layer(&layer)
    }

    fn paint_text(
        &self,
        style: &StyleConfig,
        text: &str,
        canvas: &mut Surface,
        w: f64,
    ) -> ScenecastResult<()> {
        let shaper = self.resources.text.as_ref();
        let font = style.font_family();
        let size = style.font_size();
        let box_w = w as f32;
        let Some(lines) = layout_lines(
            shaper,
            font,
            text,
            size,
            style.letter_spacing.unwrap_or(0.0),
            (box_w > 0.0).then_some(box_w),
        ) else {
            debug!(font = %font, "font unavailable; drawing no text");
            return Ok(());
        };

        let line_height = f64::from(style.line_height());
        let mut glyphs = BezPath::new();
        for (li, line) in lines.iter().enumerate() {
            let slack = if box_w > 0.0 { box_w - line.width } else { 0.0 };
            let mut x = f64::from(match style.text_align.unwrap_or_default() {
                TextAlign::Center => slack / 2.0,
                TextAlign::Right => slack,
                TextAlign::Left | TextAlign::Unknown => 0.0,
            });
            let y = li as f64 * line_height;
            for &(ch, advance) in &line.chars {
                if let Some(mut outline) = shaper.outline(font, ch, size) {
                    outline.apply_affine(Affine::translate((x, y)));
                    glyphs.extend(outline.elements().iter().copied());
                }
                x += f64::from(advance);
            }
        }
        if glyphs.elements().is_empty() {
            return Ok(());
        }
        canvas.fill_path(&glyphs, Fill::Solid(style.color.unwrap_or_else(Color::white)))
    }
}

/// `translate(center) * rotate * scale * skewX * skewY * translate(-center)`.
fn pivot_transform(style: &StyleConfig, w: f64, h: f64) -> Affine {
    let finite = |v: Option<f32>| v.filter(|v| v.is_finite()).map(f64::from);
    let mut t = Affine::translate((w / 2.0, h / 2.0));
    if let Some(deg) = finite(style.rotate) {
        t *= Affine::rotate(deg.to_radians());
    }
    if let Some(s) = finite(style.scale) {
        t *= Affine::scale(s);
    }
    if let Some(deg) = finite(style.skew_x) {
        t *= Affine::skew(deg.to_radians().tan(), 0.0);
    }
    if let Some(deg) = finite(style.skew_y) {
        t *= Affine::skew(0.0, deg.to_radians().tan());
    }
    t * Affine::translate((-w / 2.0, -h / 2.0))
}

fn rounded_box(style: &StyleConfig, w: f64, h: f64) -> BezPath {
    let max_r = w.min(h) / 2.0;
    let [tl, tr, br, bl] = style.corner_radii().map(|r| r.min(max_r));
    let rect = Rect::new(0.0, 0.0, w, h);
    if tl == 0.0 && tr == 0.0 && br == 0.0 && bl == 0.0 {
        return rect.to_path(PATH_TOLERANCE);
    }
    RoundedRect::from_rect(rect, RoundedRectRadii::new(tl, tr, br, bl)).to_path(PATH_TOLERANCE)
}

fn node_shape(node: &SceneNode, w: f64, h: f64) -> BezPath {
    match node.kind {
        NodeKind::Circle | NodeKind::Ellipse => {
            Ellipse::from_rect(Rect::new(0.0, 0.0, w, h)).to_path(PATH_TOLERANCE)
        }
        _ => rounded_box(&node.style, w, h),
    }
}

fn paint_box(
    style: &StyleConfig,
    shape: &BezPath,
    canvas: &mut Surface,
    w: f64,
    h: f64,
) -> ScenecastResult<()> {
    if let Some(g) = &style.background_gradient {
        canvas.fill_path(
            shape,
            Fill::Gradient {
                gradient: g,
                width: w,
                height: h,
            },
        )?;
    } else if let Some(c) = style.background_color {
        canvas.fill_path(shape, Fill::Solid(c))?;
    }

    if let (Some(bw), Some(color)) = (style.border_width, style.border_color)
        && bw.is_finite()
        && bw > 0.0
    {
        canvas.stroke_path(shape, &StrokeStyle::new(f64::from(bw)), color)?;
    }
    Ok(())
}

fn paint_path(style: &StyleConfig, d: &str, canvas: &mut Surface) -> ScenecastResult<()> {
    let path = match BezPath::from_svg(d.trim()) {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "unparsable path data; drawing nothing");
            return Ok(());
        }
    };
    if let Some(fill) = style.fill {
        canvas.fill_path(&path, Fill::Solid(fill))?;
    }
    if let Some(stroke) = style.stroke {
        canvas.stroke_path(&path, &StrokeStyle::from_style(style), stroke)?;
    }
    Ok(())
}

/// Place `img` in the `w x h` box per object-fit; `cover` is cropped to the box.
fn draw_fitted(
    canvas: &mut Surface,
    img: &ImageData,
    fit: Option<ObjectFit>,
    w: f64,
    h: f64,
) -> ScenecastResult<()> {
    if w <= 0.0 || h <= 0.0 {
        return Ok(());
    }
    let (iw, ih) = (f64::from(img.width()), f64::from(img.height()));
    let fit = fit.unwrap_or_default();
    let dest = match fit {
        ObjectFit::Contain | ObjectFit::Cover => {
            let (sx, sy) = (w / iw, h / ih);
            let s = if fit == ObjectFit::Cover {
                sx.max(sy)
            } else {
                sx.min(sy)
            };
            let (nw, nh) = (iw * s, ih * s);
            Rect::from_origin_size(((w - nw) / 2.0, (h - nh) / 2.0), (nw, nh))
        }
        ObjectFit::Fill | ObjectFit::Unknown => Rect::new(0.0, 0.0, w, h),
    };

    if fit == ObjectFit::Cover {
        canvas.save();
        canvas.clip_path(&Rect::new(0.0, 0.0, w, h).to_path(PATH_TOLERANCE));
        let out = canvas.draw_image(img, dest);
        canvas.restore();
        out
    } else {
        canvas.draw_image(img, dest)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
