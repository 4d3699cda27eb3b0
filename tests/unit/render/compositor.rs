use std::sync::Arc;

use super::*;
use crate::assets::{AssetStore, TextShaper};
use crate::foundation::error::ScenecastError;
use crate::layout::LayoutBox;
use crate::scene::style::{Length, Overflow, PositionKind};

/// Every glyph is a `size x size` square advancing by `size`.
struct BlockGlyphs;

impl TextShaper for BlockGlyphs {
    fn advance(&self, _font: &str, _ch: char, size: f32) -> Option<f32> {
        Some(size)
    }

    fn outline(&self, _font: &str, ch: char, size: f32) -> Option<BezPath> {
        (ch != ' ').then(|| Rect::new(0.0, 0.0, f64::from(size), f64::from(size)).to_path(0.1))
    }
}

fn px(v: f32) -> Option<Length> {
    Some(Length::Px(v))
}

fn placed(x: f32, y: f32, w: f32, h: f32) -> StyleConfig {
    StyleConfig {
        position: Some(PositionKind::Absolute),
        left: px(x),
        top: px(y),
        width: px(w),
        height: px(h),
        ..StyleConfig::default()
    }
}

fn filled(color: Color) -> StyleConfig {
    StyleConfig {
        background_color: Some(color),
        ..StyleConfig::default()
    }
}

fn red() -> Color {
    Color::from_rgba8(255, 0, 0, 255)
}

fn blue() -> Color {
    Color::from_rgba8(0, 0, 255, 255)
}

fn render_with(resources: RenderResources, scene: &SceneNode, w: u32, h: u32) -> Surface {
    let layout = resources
        .layout
        .compute_layout(scene, w as f32, h as f32)
        .unwrap();
    let mut surface = Surface::new(w, h).unwrap();
    Compositor::new(resources)
        .paint(scene, &layout, &mut surface, FrameIndex(0))
        .unwrap();
    surface
}

fn render(scene: &SceneNode, w: u32, h: u32) -> Surface {
    render_with(RenderResources::default(), scene, w, h)
}

#[test]
fn background_fills_the_whole_box() {
    let s = render(&SceneNode::rect().with_style(filled(red())), 100, 100);
    assert!(s.data().chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
    assert_eq!(s.save_depth(), 0);
}

#[test]
fn mismatched_layout_is_rejected_before_drawing() {
    let scene = SceneNode::view().with_child(SceneNode::rect().with_style(filled(red())));
    let mut surface = Surface::new(4, 4).unwrap();
    let err = Compositor::new(RenderResources::default())
        .paint(
            &scene,
            &LayoutTree::leaf(LayoutBox::new(0.0, 0.0, 4.0, 4.0)),
            &mut surface,
            FrameIndex(0),
        )
        .unwrap_err();
    assert!(matches!(err, ScenecastError::Compositing(_)));
    assert!(surface.data().iter().all(|b| *b == 0));
}

#[test]
fn z_index_orders_siblings() {
    let scene = SceneNode::view().with_children([
        SceneNode::rect().with_style(StyleConfig {
            z_index: Some(1),
            ..filled_at(blue(), 0.0, 0.0, 20.0, 20.0)
        }),
        SceneNode::rect().with_style(filled_at(red(), 0.0, 0.0, 20.0, 20.0)),
    ]);
    let s = render(&scene, 20, 20);
    assert_eq!(s.pixel(10, 10), [0, 0, 255, 255]);
}

#[test]
fn equal_z_index_keeps_declaration_order() {
    let scene = SceneNode::view().with_children([
        SceneNode::rect().with_style(filled_at(blue(), 0.0, 0.0, 20.0, 20.0)),
        SceneNode::rect().with_style(filled_at(red(), 0.0, 0.0, 20.0, 20.0)),
    ]);
    let s = render(&scene, 20, 20);
    assert_eq!(s.pixel(10, 10), [255, 0, 0, 255]);
}

fn filled_at(color: Color, x: f32, y: f32, w: f32, h: f32) -> StyleConfig {
    StyleConfig {
        background_color: Some(color),
        ..placed(x, y, w, h)
    }
}

#[test]
fn opacity_multiplies_down_the_tree() {
    let scene = SceneNode::view()
        .with_style(StyleConfig {
            opacity: Some(0.5),
            ..StyleConfig::default()
        })
        .with_child(SceneNode::rect().with_style(StyleConfig {
            opacity: Some(0.5),
            ..filled_at(Color::white(), 0.0, 0.0, 10.0, 10.0)
        }));
    let s = render(&scene, 10, 10);
    assert_eq!(s.pixel(5, 5), [64, 64, 64, 64]);
}

#[test]
fn circular_alpha_mask_keeps_the_disc() {
    let scene = SceneNode::rect()
        .with_style(filled(red()))
        .with_mask(SceneNode::circle().with_style(filled(Color::white())));
    let s = render(&scene, 100, 100);
    assert_eq!(s.pixel(50, 50), [255, 0, 0, 255]);
    assert!(s.pixel(0, 0)[3] < 8);
}

#[test]
fn inverted_alpha_mask_removes_the_disc() {
    let scene = SceneNode::rect()
        .with_style(StyleConfig {
            mask_mode: Some(MaskMode::AlphaInverted),
            ..filled(red())
        })
        .with_mask(SceneNode::circle().with_style(filled(Color::white())));
    let s = render(&scene, 100, 100);
    assert_eq!(s.pixel(50, 50)[3], 0);
    assert!(s.pixel(0, 0)[3] > 247);
}

#[test]
fn luminance_mask_uses_brightness_not_alpha() {
    let mask = SceneNode::view().with_children([
        SceneNode::rect().with_style(filled_at(Color::white(), 0.0, 0.0, 50.0, 100.0)),
        SceneNode::rect().with_style(filled_at(Color::black(), 50.0, 0.0, 50.0, 100.0)),
    ]);
    let host = |mode| {
        SceneNode::rect()
            .with_style(StyleConfig {
                mask_mode: Some(mode),
                ..filled(red())
            })
            .with_mask(mask.clone())
    };

    let lum = render(&host(MaskMode::Luminance), 100, 100);
    assert_eq!(lum.pixel(25, 50), [255, 0, 0, 255]);
    assert_eq!(lum.pixel(75, 50)[3], 0);

    let alpha = render(&host(MaskMode::Alpha), 100, 100);
    assert_eq!(alpha.pixel(75, 50), [255, 0, 0, 255]);
}

#[test]
fn overflow_hidden_clips_children() {
    let scene = SceneNode::view().with_child(
        SceneNode::view()
            .with_style(StyleConfig {
                overflow: Some(Overflow::Hidden),
                ..placed(0.0, 0.0, 10.0, 10.0)
            })
            .with_child(SceneNode::rect().with_style(filled_at(red(), 0.0, 0.0, 30.0, 30.0))),
    );
    let s = render(&scene, 30, 30);
    assert_eq!(s.pixel(5, 5), [255, 0, 0, 255]);
    assert_eq!(s.pixel(20, 20)[3], 0);
}

#[test]
fn unknown_tags_draw_nothing() {
    let scene = SceneNode::view().with_child(
        SceneNode::new(NodeKind::Unknown("sparkle".into()))
            .with_style(filled_at(red(), 0.0, 0.0, 10.0, 10.0)),
    );
    let s = render(&scene, 10, 10);
    assert!(s.data().iter().all(|b| *b == 0));
}

#[test]
fn display_none_hides_the_subtree() {
    let scene = SceneNode::view().with_child(SceneNode::rect().with_style(StyleConfig {
        display: Some(Display::None),
        ..filled_at(red(), 0.0, 0.0, 10.0, 10.0)
    }));
    let s = render(&scene, 10, 10);
    assert_eq!(s.pixel(5, 5)[3], 0);
}

#[test]
fn scale_pivots_about_the_box_center() {
    let scene = SceneNode::rect().with_style(StyleConfig {
        scale: Some(0.5),
        ..filled(red())
    });
    let s = render(&scene, 100, 100);
    assert_eq!(s.pixel(10, 10)[3], 0);
    assert_eq!(s.pixel(30, 30), [255, 0, 0, 255]);
    assert_eq!(s.pixel(69, 69), [255, 0, 0, 255]);
    assert_eq!(s.pixel(80, 80)[3], 0);
}

#[test]
fn rotation_keeps_the_center_fixed() {
    let scene = SceneNode::view().with_child(SceneNode::rect().with_style(StyleConfig {
        rotate: Some(90.0),
        ..filled_at(red(), 40.0, 20.0, 20.0, 60.0)
    }));
    let s = render(&scene, 100, 100);
    assert_eq!(s.pixel(50, 50), [255, 0, 0, 255]);
    assert_eq!(s.pixel(25, 50), [255, 0, 0, 255]);
    assert_eq!(s.pixel(50, 25)[3], 0);
}

#[test]
fn skew_applies_before_rotation() {
    // Local point p maps to rotate(skewX(p)) about the center; the reverse order would
    // shear the rotated square along device x instead.
    let scene = SceneNode::view().with_child(SceneNode::rect().with_style(StyleConfig {
        rotate: Some(90.0),
        skew_x: Some(45.0),
        ..filled_at(red(), 40.0, 40.0, 20.0, 20.0)
    }));
    let s = render(&scene, 100, 100);
    assert_eq!(s.pixel(58, 35), [255, 0, 0, 255]);
    assert_eq!(s.pixel(42, 65), [255, 0, 0, 255]);
    assert_eq!(s.pixel(42, 35)[3], 0);
    assert_eq!(s.pixel(58, 65)[3], 0);
}

#[test]
fn skew_y_applies_before_skew_x() {
    let scene = SceneNode::view().with_child(SceneNode::rect().with_style(StyleConfig {
        skew_x: Some(45.0),
        skew_y: Some(45.0),
        ..filled_at(red(), 40.0, 40.0, 20.0, 20.0)
    }));
    let s = render(&scene, 100, 100);
    assert_eq!(s.pixel(58, 50), [255, 0, 0, 255]);
    assert_eq!(s.pixel(50, 58)[3], 0);
}

#[test]
fn shadow_offset_is_not_rotated_with_the_node() {
    let scene = SceneNode::view().with_child(SceneNode::rect().with_style(StyleConfig {
        rotate: Some(90.0),
        shadow_color: Some(Color::black()),
        shadow_offset_x: Some(20.0),
        shadow_offset_y: Some(0.0),
        ..placed(10.0, 10.0, 10.0, 10.0)
    }));
    let s = render(&scene, 40, 40);
    assert_eq!(s.pixel(35, 15), [0, 0, 0, 255]);
    assert_eq!(s.pixel(15, 35)[3], 0);
}

#[test]
fn shadow_is_offset_behind_the_box() {
    let scene = SceneNode::view().with_child(SceneNode::rect().with_style(StyleConfig {
        shadow_color: Some(Color::black()),
        shadow_offset_x: Some(10.0),
        shadow_offset_y: Some(10.0),
        ..filled_at(red(), 0.0, 0.0, 20.0, 20.0)
    }));
    let s = render(&scene, 40, 40);
    assert_eq!(s.pixel(5, 5), [255, 0, 0, 255]);
    assert_eq!(s.pixel(25, 25), [0, 0, 0, 255]);
    assert_eq!(s.pixel(35, 35)[3], 0);
}

#[test]
fn border_strokes_the_edge() {
    let scene = SceneNode::rect().with_style(StyleConfig {
        border_width: Some(4.0),
        border_color: Some(blue()),
        ..filled(red())
    });
    let s = render(&scene, 20, 20);
    assert_eq!(s.pixel(0, 10), [0, 0, 255, 255]);
    assert_eq!(s.pixel(10, 10), [255, 0, 0, 255]);
}

#[test]
fn filters_apply_to_the_node_layer() {
    let scene = SceneNode::view().with_children([
        SceneNode::rect().with_style(StyleConfig {
            invert: Some(1.0),
            ..filled_at(red(), 0.0, 0.0, 10.0, 10.0)
        }),
        SceneNode::rect().with_style(filled_at(red(), 10.0, 0.0, 10.0, 10.0)),
    ]);
    let s = render(&scene, 20, 10);
    assert_eq!(s.pixel(5, 5), [0, 255, 255, 255]);
    assert_eq!(s.pixel(15, 5), [255, 0, 0, 255]);
}

#[test]
fn blend_mode_composites_against_the_backdrop() {
    let scene = SceneNode::rect()
        .with_style(filled(Color::from_rgba8(255, 128, 0, 255)))
        .with_child(SceneNode::rect().with_style(StyleConfig {
            blend_mode: Some(BlendMode::Multiply),
            ..filled_at(Color::from_rgba8(128, 255, 255, 255), 0.0, 0.0, 4.0, 4.0)
        }));
    let s = render(&scene, 4, 4);
    assert_eq!(s.pixel(1, 1), [128, 128, 0, 255]);
}

fn green_store() -> AssetStore {
    let mut store = AssetStore::new();
    store.insert_image(
        "wide",
        ImageData::from_premul_rgba8(2, 1, [0, 255, 0, 255].repeat(2)).unwrap(),
    );
    store
}

#[test]
fn contain_letterboxes_the_image() {
    let scene = SceneNode::image("wide").with_style(StyleConfig {
        object_fit: Some(ObjectFit::Contain),
        ..StyleConfig::default()
    });
    let resources = RenderResources::from_store(green_store(), Arc::new(BlockGlyphs));
    let s = render_with(resources, &scene, 100, 100);
    assert_eq!(s.pixel(50, 10)[3], 0);
    assert_eq!(s.pixel(50, 50), [0, 255, 0, 255]);
    assert_eq!(s.pixel(50, 90)[3], 0);
}

#[test]
fn cover_is_cropped_to_the_box() {
    let scene = SceneNode::view().with_child(SceneNode::image("wide").with_style(StyleConfig {
        object_fit: Some(ObjectFit::Cover),
        ..placed(0.0, 0.0, 100.0, 100.0)
    }));
    let resources = RenderResources::from_store(green_store(), Arc::new(BlockGlyphs));
    let s = render_with(resources, &scene, 200, 100);
    assert_eq!(s.pixel(5, 50), [0, 255, 0, 255]);
    assert_eq!(s.pixel(95, 50), [0, 255, 0, 255]);
    assert_eq!(s.pixel(120, 50)[3], 0);
}

#[test]
fn missing_image_draws_nothing() {
    let scene = SceneNode::image("absent").with_style(placed(0.0, 0.0, 10.0, 10.0));
    let s = render(&scene, 10, 10);
    assert!(s.data().iter().all(|b| *b == 0));
}

#[test]
fn video_reads_the_requested_frame() {
    let mut store = AssetStore::new();
    store.insert_frame(
        "clip",
        FrameIndex(3),
        ImageData::from_premul_rgba8(1, 1, vec![0, 0, 255, 255]).unwrap(),
    );
    let resources = RenderResources::from_store(store, Arc::new(BlockGlyphs));
    let scene = SceneNode::video("clip");
    let layout = resources.layout.compute_layout(&scene, 8.0, 8.0).unwrap();
    let compositor = Compositor::new(resources);

    let mut hit = Surface::new(8, 8).unwrap();
    compositor
        .paint(&scene, &layout, &mut hit, FrameIndex(3))
        .unwrap();
    assert_eq!(hit.pixel(4, 4), [0, 0, 255, 255]);

    let mut miss = Surface::new(8, 8).unwrap();
    compositor
        .paint(&scene, &layout, &mut miss, FrameIndex(2))
        .unwrap();
    assert_eq!(miss.pixel(4, 4)[3], 0);
}

#[test]
fn centered_text_is_offset_by_half_the_slack() {
    let scene = SceneNode::text("ab").with_style(StyleConfig {
        width: px(100.0),
        height: px(20.0),
        font_size: Some(10.0),
        text_align: Some(TextAlign::Center),
        ..StyleConfig::default()
    });
    let resources = RenderResources::from_store(AssetStore::new(), Arc::new(BlockGlyphs));
    let s = render_with(resources, &scene, 100, 20);
    assert_eq!(s.pixel(45, 5), [255, 255, 255, 255]);
    assert_eq!(s.pixel(55, 5), [255, 255, 255, 255]);
    assert_eq!(s.pixel(35, 5)[3], 0);
    assert_eq!(s.pixel(65, 5)[3], 0);
}

#[test]
fn text_without_fonts_renders_empty() {
    let scene = SceneNode::text("hello").with_style(placed(0.0, 0.0, 50.0, 20.0));
    let s = render(&scene, 50, 20);
    assert!(s.data().iter().all(|b| *b == 0));
}

#[test]
fn path_fill_and_bad_path_data() {
    let scene = SceneNode::view().with_children([
        SceneNode::path("M0 0 L10 0 L10 10 L0 10 Z").with_style(StyleConfig {
            fill: Some(red()),
            ..placed(0.0, 0.0, 10.0, 10.0)
        }),
        SceneNode::path("M0 0 Q oops").with_style(StyleConfig {
            fill: Some(blue()),
            ..placed(10.0, 0.0, 10.0, 10.0)
        }),
    ]);
    let s = render(&scene, 20, 10);
    assert_eq!(s.pixel(5, 5), [255, 0, 0, 255]);
    assert_eq!(s.pixel(15, 5)[3], 0);
}
