use super::*;
use crate::assets::store::ImageData;
use crate::foundation::core::BezPath;

fn px(v: f32) -> Option<Length> {
    Some(Length::Px(v))
}

fn sized(w: f32, h: f32) -> StyleConfig {
    StyleConfig {
        width: px(w),
        height: px(h),
        ..StyleConfig::default()
    }
}

struct TenPx;

impl TextShaper for TenPx {
    fn advance(&self, _font: &str, _ch: char, _size: f32) -> Option<f32> {
        Some(10.0)
    }

    fn outline(&self, _font: &str, _ch: char, _size: f32) -> Option<BezPath> {
        None
    }
}

#[test]
fn root_defaults_to_container_size() {
    let tree = TaffyLayout::default()
        .compute_layout(&SceneNode::view(), 320.0, 180.0)
        .unwrap();
    assert_eq!(tree.bx, LayoutBox::new(0.0, 0.0, 320.0, 180.0));
}

#[test]
fn children_stack_as_a_column_by_default() {
    let scene = SceneNode::view()
        .with_child(SceneNode::rect().with_style(sized(40.0, 10.0)))
        .with_child(SceneNode::rect().with_style(sized(40.0, 20.0)));
    let tree = TaffyLayout::default()
        .compute_layout(&scene, 100.0, 100.0)
        .unwrap();
    assert_eq!(tree.children[0].bx, LayoutBox::new(0.0, 0.0, 40.0, 10.0));
    assert_eq!(tree.children[1].bx, LayoutBox::new(0.0, 10.0, 40.0, 20.0));
}

#[test]
fn row_with_centered_content_and_gap() {
    let root = StyleConfig {
        flex_direction: Some(scene_style::FlexDirection::Row),
        justify_content: Some(scene_style::JustifyContent::Center),
        gap: Some(10.0),
        ..StyleConfig::default()
    };
    let scene = SceneNode::view()
        .with_style(root)
        .with_child(SceneNode::rect().with_style(sized(20.0, 20.0)))
        .with_child(SceneNode::rect().with_style(sized(20.0, 20.0)));
    let tree = TaffyLayout::default()
        .compute_layout(&scene, 100.0, 50.0)
        .unwrap();
    // 20 + 10 + 20 = 50 wide, centered in 100.
    assert_eq!(tree.children[0].bx.x, 25.0);
    assert_eq!(tree.children[1].bx.x, 55.0);
}

#[test]
fn percent_sizes_and_absolute_insets() {
    let child = StyleConfig {
        width: Some(Length::Percent(0.5)),
        height: Some(Length::Percent(0.25)),
        position: Some(scene_style::PositionKind::Absolute),
        left: px(7.0),
        top: px(3.0),
        ..StyleConfig::default()
    };
    let scene = SceneNode::view().with_child(SceneNode::rect().with_style(child));
    let tree = TaffyLayout::default()
        .compute_layout(&scene, 200.0, 100.0)
        .unwrap();
    assert_eq!(tree.children[0].bx, LayoutBox::new(7.0, 3.0, 100.0, 25.0));
}

#[test]
fn image_leaves_take_their_intrinsic_size() {
    let mut store = AssetStore::new();
    store.insert_image(
        "logo",
        ImageData::from_premul_rgba8(30, 12, vec![0; 30 * 12 * 4]).unwrap(),
    );
    let layout = TaffyLayout::new(Arc::new(store), Arc::new(NoFonts));
    let scene = SceneNode::view().with_child(SceneNode::image("logo"));
    let tree = layout.compute_layout(&scene, 100.0, 100.0).unwrap();
    // Column container stretches the cross axis (width).
    assert_eq!(tree.children[0].bx.height, 12.0);
}

#[test]
fn text_leaves_are_measured_by_the_shaper() {
    let layout = TaffyLayout::new(Arc::new(AssetStore::new()), Arc::new(TenPx));
    let root = StyleConfig {
        align_items: Some(scene_style::AlignItems::FlexStart),
        ..StyleConfig::default()
    };
    let text_style = StyleConfig {
        font_size: Some(10.0),
        line_height: Some(15.0),
        ..StyleConfig::default()
    };
    let scene = SceneNode::view()
        .with_style(root)
        .with_child(SceneNode::text("ab\ncde").with_style(text_style));
    let tree = layout.compute_layout(&scene, 100.0, 100.0).unwrap();
    assert_eq!(tree.children[0].bx.width, 30.0);
    assert_eq!(tree.children[0].bx.height, 30.0);
}

#[test]
fn display_none_collapses_the_box() {
    let hidden = StyleConfig {
        display: Some(scene_style::Display::None),
        ..sized(40.0, 40.0)
    };
    let scene = SceneNode::view().with_child(SceneNode::rect().with_style(hidden));
    let tree = TaffyLayout::default()
        .compute_layout(&scene, 100.0, 100.0)
        .unwrap();
    assert_eq!(tree.children[0].bx.width, 0.0);
    assert_eq!(tree.children[0].bx.height, 0.0);
}

#[test]
fn output_topology_mirrors_scene_including_unknown_tags() {
    let scene = SceneNode::view()
        .with_child(SceneNode::new(NodeKind::Unknown("sparkle".into())).with_child(SceneNode::rect()))
        .with_child(SceneNode::circle());
    let tree = TaffyLayout::default()
        .compute_layout(&scene, 64.0, 64.0)
        .unwrap();
    assert!(tree.check_topology(&scene).is_ok());
}
