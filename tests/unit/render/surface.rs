use super::*;
use crate::scene::style::{BlendMode, Gradient};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
    Rect::new(x0, y0, x1, y1).to_path(0.1)
}

fn red() -> Color {
    Color::from_rgba8(255, 0, 0, 255)
}

#[test]
fn fill_solid_rect_covers_exact_pixels() {
    let mut s = Surface::new(10, 10).unwrap();
    s.fill_path(&rect(0.0, 0.0, 5.0, 10.0), Fill::Solid(red()))
        .unwrap();
    assert_eq!(s.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(s.pixel(4, 9), [255, 0, 0, 255]);
    assert_eq!(s.pixel(5, 0), [0, 0, 0, 0]);
}

#[test]
fn translate_and_restore_scope_the_transform() {
    let mut s = Surface::new(10, 10).unwrap();
    s.save();
    s.translate(5.0, 5.0);
    s.fill_path(&rect(0.0, 0.0, 2.0, 2.0), Fill::Solid(red()))
        .unwrap();
    s.restore();
    assert_eq!(s.pixel(6, 6), [255, 0, 0, 255]);
    assert_eq!(s.pixel(1, 1), [0, 0, 0, 0]);
    assert_eq!(s.transform(), Affine::IDENTITY);
}

#[test]
fn unmatched_restore_is_a_no_op() {
    let mut s = Surface::new(4, 4).unwrap();
    s.translate(1.0, 0.0);
    s.restore();
    assert_eq!(s.transform(), Affine::translate((1.0, 0.0)));
    assert_eq!(s.save_depth(), 0);
}

#[test]
fn opacity_compounds_and_scales_fills() {
    let mut s = Surface::new(2, 2).unwrap();
    s.multiply_opacity(0.5);
    s.multiply_opacity(0.5);
    assert_eq!(s.opacity(), 0.25);
    s.fill_path(&rect(0.0, 0.0, 2.0, 2.0), Fill::Solid(Color::white()))
        .unwrap();
    assert_eq!(s.pixel(0, 0), [64, 64, 64, 64]);
}

#[test]
fn clip_limits_drawing() {
    let mut s = Surface::new(10, 10).unwrap();
    s.clip_path(&rect(0.0, 0.0, 3.0, 10.0));
    s.fill_path(&rect(0.0, 0.0, 10.0, 10.0), Fill::Solid(red()))
        .unwrap();
    assert_eq!(s.pixel(1, 5)[3], 255);
    assert_eq!(s.pixel(6, 5)[3], 0);
}

#[test]
fn nested_clips_intersect() {
    let mut s = Surface::new(10, 10).unwrap();
    s.clip_path(&rect(0.0, 0.0, 6.0, 10.0));
    s.clip_path(&rect(4.0, 0.0, 10.0, 10.0));
    s.fill_path(&rect(0.0, 0.0, 10.0, 10.0), Fill::Solid(red()))
        .unwrap();
    assert_eq!(s.pixel(2, 5)[3], 0);
    assert_eq!(s.pixel(5, 5)[3], 255);
    assert_eq!(s.pixel(8, 5)[3], 0);
}

#[test]
fn blend_operator_applies_to_fills() {
    let mut s = Surface::new(2, 2).unwrap();
    s.clear(Some(Color::from_rgba8(255, 128, 0, 255)));
    s.set_composite(BlendMode::Multiply.into());
    s.fill_path(
        &rect(0.0, 0.0, 2.0, 2.0),
        Fill::Solid(Color::from_rgba8(128, 255, 255, 255)),
    )
    .unwrap();
    assert_eq!(s.pixel(0, 0), [128, 128, 0, 255]);
}

#[test]
fn gradient_fill_spans_the_box() {
    let g = Gradient::linear(90.0, vec![Color::black(), Color::white()]);
    let mut s = Surface::new(20, 4).unwrap();
    s.fill_path(
        &rect(0.0, 0.0, 20.0, 4.0),
        Fill::Gradient {
            gradient: &g,
            width: 20.0,
            height: 4.0,
        },
    )
    .unwrap();
    assert!(s.pixel(0, 2)[0] < 10);
    assert!(s.pixel(19, 2)[0] > 245);
    assert_eq!(s.pixel(10, 2)[3], 255);
}

#[test]
fn gradient_box_wider_than_any_surface_still_fills() {
    let g = Gradient::linear(90.0, vec![Color::black(), Color::white()]);
    let fill = Fill::Gradient {
        gradient: &g,
        width: 70_000.0,
        height: 4.0,
    };
    let mut s = Surface::new(32, 4).unwrap();
    s.fill_path(&rect(0.0, 0.0, 70_000.0, 4.0), fill).unwrap();
    assert_eq!(s.pixel(31, 2), [0, 0, 0, 255]);

    let mut tail = Surface::new(32, 4).unwrap();
    tail.translate(-69_990.0, 0.0);
    tail.fill_path(&rect(0.0, 0.0, 70_000.0, 4.0), fill).unwrap();
    assert!(tail.pixel(9, 2)[0] > 250);
    assert_eq!(tail.pixel(10, 2)[3], 0);
}

#[test]
fn device_translation_ignores_user_scale() {
    let mut s = Surface::new(10, 4).unwrap();
    s.concat(Affine::scale(2.0));
    s.translate_device(3.0, 0.0);
    s.fill_path(&rect(0.0, 0.0, 1.0, 1.0), Fill::Solid(red()))
        .unwrap();
    assert_eq!(s.pixel(2, 0)[3], 0);
    assert_eq!(s.pixel(3, 1), [255, 0, 0, 255]);
    assert_eq!(s.pixel(4, 0), [255, 0, 0, 255]);
    assert_eq!(s.pixel(5, 0)[3], 0);
}

#[test]
fn stroke_draws_outline_only() {
    let mut s = Surface::new(20, 20).unwrap();
    s.stroke_path(
        &rect(2.0, 2.0, 18.0, 18.0),
        &StrokeStyle::new(2.0),
        Color::white(),
    )
    .unwrap();
    assert_eq!(s.pixel(10, 2)[3], 255);
    assert_eq!(s.pixel(10, 10)[3], 0);
}

#[test]
fn draw_image_scales_into_destination() {
    let img = ImageData::from_premul_rgba8(1, 1, vec![0, 0, 255, 255]).unwrap();
    let mut s = Surface::new(8, 8).unwrap();
    s.draw_image(&img, Rect::new(2.0, 2.0, 6.0, 6.0)).unwrap();
    assert_eq!(s.pixel(3, 3), [0, 0, 255, 255]);
    assert_eq!(s.pixel(0, 0)[3], 0);
}

#[test]
fn layer_composite_uses_opacity() {
    let mut base = Surface::new(4, 4).unwrap();
    let mut layer = base.new_layer().unwrap();
    layer.clear(Some(Color::white()));
    base.multiply_opacity(0.5);
    base.composite_layer(&layer).unwrap();
    assert_eq!(base.pixel(1, 1), [128, 128, 128, 128]);

    let other = Surface::new(2, 2).unwrap();
    assert!(base.composite_layer(&other).is_err());
}

#[test]
fn draw_surface_places_pixels_at_offset() {
    let mut src = Surface::new(2, 2).unwrap();
    src.clear(Some(red()));
    let mut dst = Surface::new(6, 6).unwrap();
    dst.draw_surface(&src, Point::new(3.0, 3.0)).unwrap();
    assert_eq!(dst.pixel(3, 3), [255, 0, 0, 255]);
    assert_eq!(dst.pixel(4, 4), [255, 0, 0, 255]);
    assert_eq!(dst.pixel(1, 1)[3], 0);
}

#[test]
fn mask_coverage_modes() {
    let mut m = Surface::new(1, 1).unwrap();
    m.clear(Some(Color::from_rgba8(255, 255, 255, 128)));
    assert_eq!(m.mask_coverage(MaskMode::Alpha), vec![128]);
    assert_eq!(m.mask_coverage(MaskMode::Luminance), vec![128]);
    m.clear(Some(Color::black()));
    assert_eq!(m.mask_coverage(MaskMode::Alpha), vec![255]);
    assert_eq!(m.mask_coverage(MaskMode::Luminance), vec![0]);
}

#[test]
fn mask_with_destination_in_and_out() {
    let mut s = Surface::new(2, 1).unwrap();
    s.clear(Some(red()));
    s.mask_with(&[255, 0], CompositeOp::DestinationIn).unwrap();
    assert_eq!(s.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(s.pixel(1, 0), [0, 0, 0, 0]);

    s.clear(Some(red()));
    s.mask_with(&[255, 0], CompositeOp::DestinationOut).unwrap();
    assert_eq!(s.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(s.pixel(1, 0), [255, 0, 0, 255]);

    assert!(s.mask_with(&[0], CompositeOp::DestinationIn).is_err());
}

#[test]
fn filters_apply_to_whole_surface() {
    let mut s = Surface::new(2, 2).unwrap();
    s.clear(Some(red()));
    s.apply_filters(&FilterChain::from_filters([
        crate::render::filters::Filter::Invert(1.0),
    ]))
    .unwrap();
    assert_eq!(s.pixel(1, 1), [0, 255, 255, 255]);
}

#[test]
fn into_frame_is_premultiplied() {
    let s = Surface::new(3, 2).unwrap();
    let f = s.into_frame();
    assert!(f.premultiplied);
    assert_eq!(f.data.len(), 24);
}
