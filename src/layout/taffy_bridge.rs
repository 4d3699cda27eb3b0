use std::sync::Arc;

use taffy::prelude::{AvailableSpace, NodeId, Rect, Size};
use taffy::style::{
    AlignItems, Dimension, Display, FlexDirection, FlexWrap, JustifyContent, LengthPercentage,
    LengthPercentageAuto, Position, Style,
};

use crate::assets::store::{AssetProvider, AssetStore};
use crate::assets::text::{NoFonts, TextShaper, layout_lines, measure_block};
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::layout::{LayoutBox, LayoutProvider, LayoutTree};
use crate::scene::model::{NodeKind, SceneNode};
use crate::scene::style::{self as scene_style, Length, StyleConfig, non_negative};

/// Leaf measurement payload stored on taffy nodes.
#[derive(Debug, Clone)]
enum LeafMeasure {
    Intrinsic(Size<f32>),
    Text {
        text: String,
        font: String,
        size: f32,
        letter_spacing: f32,
        line_height: f32,
    },
}

/// Default [`LayoutProvider`]: a fresh `taffy` flexbox tree per call.
///
/// Text leaves are measured through the [`TextShaper`], image leaves through their decoded size.
/// Unset `flexDirection` means column.
pub struct TaffyLayout {
    assets: Arc<dyn AssetProvider>,
    text: Arc<dyn TextShaper>,
}

impl TaffyLayout {
    /// Provider measuring leaves with `assets` and `text`.
    pub fn new(assets: Arc<dyn AssetProvider>, text: Arc<dyn TextShaper>) -> Self {
        Self { assets, text }
    }

    fn build(
        &self,
        taffy: &mut taffy::TaffyTree<LeafMeasure>,
        node: &SceneNode,
        container: Option<(f32, f32)>,
    ) -> Result<NodeId, taffy::TaffyError> {
        let mut style = taffy_style(&node.style);
        if let Some((w, h)) = container {
            if node.style.width.is_none() {
                style.size.width = Dimension::length(w);
            }
            if node.style.height.is_none() {
                style.size.height = Dimension::length(h);
            }
        }

        if node.children.is_empty() {
            return match self.leaf_measure(node) {
                Some(m) => taffy.new_leaf_with_context(style, m),
                None => taffy.new_leaf(style),
            };
        }

        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            children.push(self.build(taffy, child, None)?);
        }
        taffy.new_with_children(style, &children)
    }

    fn leaf_measure(&self, node: &SceneNode) -> Option<LeafMeasure> {
        match &node.kind {
            NodeKind::Text { text } => Some(LeafMeasure::Text {
                text: text.clone(),
                font: node.style.font_family().to_owned(),
                size: node.style.font_size(),
                letter_spacing: node.style.letter_spacing.unwrap_or(0.0),
                line_height: node.style.line_height(),
            }),
            NodeKind::Image { src } => self.assets.image(src).map(|img| {
                LeafMeasure::Intrinsic(Size {
                    width: img.width() as f32,
                    height: img.height() as f32,
                })
            }),
            _ => None,
        }
    }

    fn measure_text(
        &self,
        m: &LeafMeasure,
        known: Size<Option<f32>>,
        available: Size<AvailableSpace>,
    ) -> Size<f32> {
        let LeafMeasure::Text {
            text,
            font,
            size,
            letter_spacing,
            line_height,
        } = m
        else {
            return Size::ZERO;
        };
        let max_width = known.width.or(match available.width {
            AvailableSpace::Definite(w) => Some(w),
            _ => None,
        });
        let Some(lines) =
            layout_lines(self.text.as_ref(), font, text, *size, *letter_spacing, max_width)
        else {
            return known.unwrap_or(Size::ZERO);
        };
        let (width, height) = measure_block(&lines, *line_height);
        known.unwrap_or(Size { width, height })
    }
}

impl Default for TaffyLayout {
    fn default() -> Self {
        Self::new(Arc::new(AssetStore::new()), Arc::new(NoFonts))
    }
}

impl std::fmt::Debug for TaffyLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaffyLayout").finish_non_exhaustive()
    }
}

impl LayoutProvider for TaffyLayout {
    fn compute_layout(
        &self,
        scene: &SceneNode,
        width: f32,
        height: f32,
    ) -> ScenecastResult<LayoutTree> {
        let mut taffy = taffy::TaffyTree::<LeafMeasure>::new();
        let root = self
            .build(&mut taffy, scene, Some((width, height)))
            .map_err(layout_error)?;

        let available = Size {
            width: AvailableSpace::Definite(width),
            height: AvailableSpace::Definite(height),
        };
        taffy
            .compute_layout_with_measure(
                root,
                available,
                |known_dimensions, available_space, _node_id, node_context, _style| {
                    match node_context {
                        Some(LeafMeasure::Intrinsic(intrinsic)) => {
                            known_dimensions.unwrap_or(*intrinsic)
                        }
                        Some(m) => self.measure_text(m, known_dimensions, available_space),
                        None => known_dimensions.unwrap_or(Size::ZERO),
                    }
                },
            )
            .map_err(layout_error)?;

        collect(&taffy, root).map_err(layout_error)
    }
}

fn collect(
    taffy: &taffy::TaffyTree<LeafMeasure>,
    nid: NodeId,
) -> Result<LayoutTree, taffy::TaffyError> {
    let l = taffy.layout(nid)?;
    let bx = LayoutBox::new(l.location.x, l.location.y, l.size.width, l.size.height);
    let children = taffy
        .children(nid)?
        .into_iter()
        .map(|c| collect(taffy, c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LayoutTree { bx, children })
}

fn layout_error(e: taffy::TaffyError) -> ScenecastError {
    ScenecastError::layout(e.to_string())
}

fn taffy_style(s: &StyleConfig) -> Style {
    let display = match s.display {
        Some(scene_style::Display::None) => Display::None,
        _ => Display::Flex,
    };
    let position = match s.position {
        Some(scene_style::PositionKind::Absolute) => Position::Absolute,
        _ => Position::Relative,
    };
    let flex_direction = match s.flex_direction {
        Some(scene_style::FlexDirection::Row) => FlexDirection::Row,
        Some(scene_style::FlexDirection::RowReverse) => FlexDirection::RowReverse,
        Some(scene_style::FlexDirection::ColumnReverse) => FlexDirection::ColumnReverse,
        _ => FlexDirection::Column,
    };
    let flex_wrap = match s.flex_wrap {
        Some(scene_style::FlexWrap::Wrap) => FlexWrap::Wrap,
        _ => FlexWrap::NoWrap,
    };
    let justify_content = s.justify_content.and_then(|j| match j {
        scene_style::JustifyContent::FlexStart => Some(JustifyContent::FlexStart),
        scene_style::JustifyContent::FlexEnd => Some(JustifyContent::FlexEnd),
        scene_style::JustifyContent::Center => Some(JustifyContent::Center),
        scene_style::JustifyContent::SpaceBetween => Some(JustifyContent::SpaceBetween),
        scene_style::JustifyContent::SpaceAround => Some(JustifyContent::SpaceAround),
        scene_style::JustifyContent::SpaceEvenly => Some(JustifyContent::SpaceEvenly),
        scene_style::JustifyContent::Unknown => None,
    });

    // CSS `flex: N`
    let (mut flex_grow, mut flex_shrink, mut flex_basis) = (0.0, 1.0, dimension(s.flex_basis));
    if let Some(f) = s.flex.filter(|f| f.is_finite()) {
        if f > 0.0 {
            flex_grow = f;
            flex_basis = Dimension::length(0.0);
        } else if f < 0.0 {
            flex_shrink = -f;
        }
    }
    if let Some(g) = s.flex_grow {
        flex_grow = non_negative(g);
    }
    if let Some(sh) = s.flex_shrink {
        flex_shrink = non_negative(sh);
    }

    let gap_all = non_negative(s.gap.unwrap_or(0.0));
    let gap = Size {
        width: LengthPercentage::length(s.column_gap.map_or(gap_all, non_negative)),
        height: LengthPercentage::length(s.row_gap.map_or(gap_all, non_negative)),
    };

    let side = |v: Option<f32>, all: Option<f32>| v.or(all).unwrap_or(0.0);
    let margin = Rect {
        left: LengthPercentageAuto::length(side(s.margin_left, s.margin)),
        right: LengthPercentageAuto::length(side(s.margin_right, s.margin)),
        top: LengthPercentageAuto::length(side(s.margin_top, s.margin)),
        bottom: LengthPercentageAuto::length(side(s.margin_bottom, s.margin)),
    };
    let padding = Rect {
        left: LengthPercentage::length(non_negative(side(s.padding_left, s.padding))),
        right: LengthPercentage::length(non_negative(side(s.padding_right, s.padding))),
        top: LengthPercentage::length(non_negative(side(s.padding_top, s.padding))),
        bottom: LengthPercentage::length(non_negative(side(s.padding_bottom, s.padding))),
    };
    let inset = Rect {
        left: inset(s.left),
        right: inset(s.right),
        top: inset(s.top),
        bottom: inset(s.bottom),
    };

    Style {
        display,
        position,
        inset,
        flex_direction,
        flex_wrap,
        justify_content,
        align_items: s.align_items.and_then(align),
        align_self: s.align_self.and_then(align),
        gap,
        padding,
        margin,
        flex_grow,
        flex_shrink,
        flex_basis,
        size: Size {
            width: dimension(s.width),
            height: dimension(s.height),
        },
        min_size: Size {
            width: dimension(s.min_width),
            height: dimension(s.min_height),
        },
        max_size: Size {
            width: dimension(s.max_width),
            height: dimension(s.max_height),
        },
        aspect_ratio: s.aspect_ratio.filter(|r| r.is_finite() && *r > 0.0),
        ..Style::default()
    }
}

fn align(a: scene_style::AlignItems) -> Option<AlignItems> {
    match a {
        scene_style::AlignItems::FlexStart => Some(AlignItems::FlexStart),
        scene_style::AlignItems::FlexEnd => Some(AlignItems::FlexEnd),
        scene_style::AlignItems::Center => Some(AlignItems::Center),
        scene_style::AlignItems::Stretch => Some(AlignItems::Stretch),
        scene_style::AlignItems::Baseline => Some(AlignItems::Baseline),
        scene_style::AlignItems::Unknown => None,
    }
}

fn dimension(l: Option<Length>) -> Dimension {
    match l {
        Some(Length::Px(v)) => Dimension::length(v.max(0.0)),
        Some(Length::Percent(p)) => Dimension::percent(p.max(0.0)),
        Some(Length::Auto) | None => Dimension::auto(),
    }
}

fn inset(l: Option<Length>) -> LengthPercentageAuto {
    match l {
        Some(Length::Px(v)) => LengthPercentageAuto::length(v),
        Some(Length::Percent(p)) => LengthPercentageAuto::percent(p),
        Some(Length::Auto) | None => LengthPercentageAuto::auto(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/taffy_bridge.rs"]
mod tests;
