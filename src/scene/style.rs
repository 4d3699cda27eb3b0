use serde::{Deserialize, Serialize};

use crate::scene::color::Color;

/// A layout length: pixels, a percentage of the parent, or `auto`.
///
/// JSON numbers are pixels; strings accept `"50%"`, `"12px"`, `"12"` and `"auto"`. Anything else
/// behaves as `auto`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    /// Absolute pixels.
    Px(f32),
    /// Fraction of the parent dimension (`0.5` for `"50%"`).
    Percent(f32),
    /// Let layout decide.
    Auto,
}

impl Length {
    fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Some(p) = s.strip_suffix('%') {
            return p
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map_or(Self::Auto, |v| Self::Percent(v / 100.0));
        }
        let s = s.strip_suffix("px").unwrap_or(s);
        s.trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .map_or(Self::Auto, Self::Px)
    }
}

impl Serialize for Length {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Px(v) => serializer.serialize_f32(*v),
            Self::Percent(p) => serializer.serialize_str(&format!("{}%", p * 100.0)),
            Self::Auto => serializer.serialize_str("auto"),
        }
    }
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f32),
            Str(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Num(v) if v.is_finite() => Self::Px(v),
            Repr::Num(_) => Self::Auto,
            Repr::Str(s) => Self::parse(&s),
        })
    }
}

/// Composite blend modes selectable per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlendMode {
    /// Plain source-over.
    Normal,
    /// `s * d`.
    Multiply,
    /// `s + d - s * d`.
    Screen,
    /// Hard light with swapped inputs.
    Overlay,
    /// `min(s, d)`.
    Darken,
    /// `max(s, d)`.
    Lighten,
    /// Brighten the backdrop towards the source.
    ColorDodge,
    /// Darken the backdrop towards the source.
    ColorBurn,
    /// Multiply or screen depending on the source.
    HardLight,
    /// Soft variant of hard light.
    SoftLight,
    /// `|d - s|`.
    Difference,
    /// `d + s - 2ds`.
    Exclusion,
    /// Source hue with backdrop saturation and luminosity.
    Hue,
    /// Source saturation with backdrop hue and luminosity.
    Saturation,
    /// Source hue and saturation with backdrop luminosity.
    Color,
    /// Source luminosity with backdrop hue and saturation.
    Luminosity,
    /// Additive (`plus-lighter`).
    Plus,
    /// Unrecognized mode; leaves the inherited operator in place.
    #[serde(other)]
    Unknown,
}

/// Overflow behaviour of a node's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Overflow {
    /// Content may paint outside the box.
    #[default]
    Visible,
    /// Content is clipped to the (optionally rounded) border box.
    Hidden,
    /// Unrecognized value; treated as visible.
    #[serde(other)]
    Unknown,
}

/// How a mask subtree gates its host's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaskMode {
    /// Mask alpha keeps content.
    #[default]
    Alpha,
    /// Mask alpha removes content.
    AlphaInverted,
    /// Mask luminance keeps content.
    Luminance,
    /// Mask luminance removes content.
    LuminanceInverted,
    /// Unrecognized value; treated as alpha.
    #[serde(other)]
    Unknown,
}

/// Image and video fitting inside the node box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectFit {
    /// Stretch to the box.
    #[default]
    Fill,
    /// Scale uniformly to fit inside the box, centered.
    Contain,
    /// Scale uniformly to cover the box, centered and cropped.
    Cover,
    /// Unrecognized value; treated as fill.
    #[serde(other)]
    Unknown,
}

/// Horizontal alignment of text lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered in the box.
    Center,
    /// Flush right.
    Right,
    /// Unrecognized value; treated as left.
    #[serde(other)]
    Unknown,
}

/// Stroke end caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineCap {
    /// Flat, ending at the endpoint.
    #[default]
    Butt,
    /// Semicircular.
    Round,
    /// Flat, extended by half the width.
    Square,
    /// Unrecognized value; treated as butt.
    #[serde(other)]
    Unknown,
}

/// Stroke corner joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineJoin {
    /// Sharp corners.
    #[default]
    Miter,
    /// Rounded corners.
    Round,
    /// Cut-off corners.
    Bevel,
    /// Unrecognized value; treated as miter.
    #[serde(other)]
    Unknown,
}

/// Flex layout direction (CSS keywords, e.g. `"row-reverse"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum FlexDirection {
    Row,
    Column,
    RowReverse,
    ColumnReverse,
    #[serde(other)]
    Unknown,
}

/// Flex line wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum FlexWrap {
    #[serde(rename = "nowrap")]
    NoWrap,
    Wrap,
    #[serde(other)]
    Unknown,
}

/// Main-axis distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum JustifyContent {
    FlexStart,
    FlexEnd,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
    #[serde(other)]
    Unknown,
}

/// Cross-axis alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(missing_docs)]
pub enum AlignItems {
    FlexStart,
    FlexEnd,
    Center,
    Stretch,
    Baseline,
    #[serde(other)]
    Unknown,
}

/// Positioning scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum PositionKind {
    Relative,
    Absolute,
    #[serde(other)]
    Unknown,
}

/// Display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum Display {
    Flex,
    None,
    #[serde(other)]
    Unknown,
}

/// Gradient geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GradientKind {
    /// Along an angle through the box center.
    #[default]
    Linear,
    /// Outwards from the box center.
    Radial,
    /// Unrecognized value; treated as linear.
    #[serde(other)]
    Unknown,
}

/// Background gradient definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    /// Linear or radial.
    #[serde(rename = "type", default)]
    pub kind: GradientKind,
    /// Colour stops, in order.
    pub colors: Vec<Color>,
    /// Stop offsets in `0..=1`; evenly spaced when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stops: Option<Vec<f32>>,
    /// CSS-style angle in degrees (180 = top to bottom, 90 = left to right).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f32>,
}

impl Gradient {
    /// Linear gradient between `colors` at `angle` degrees.
    pub fn linear(angle: f32, colors: Vec<Color>) -> Self {
        Self {
            kind: GradientKind::Linear,
            colors,
            stops: None,
            angle: Some(angle),
        }
    }

    /// Radial gradient from the center outwards.
    pub fn radial(colors: Vec<Color>) -> Self {
        Self {
            kind: GradientKind::Radial,
            colors,
            stops: None,
            angle: None,
        }
    }
}

/// Per-node style: layout fields for the layout provider plus paint fields for the compositor.
///
/// Every field is optional; absent fields take the documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct StyleConfig {
    // layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Display>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex_grow: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex_shrink: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex_basis: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex_direction: Option<FlexDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex_wrap: Option<FlexWrap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justify_content: Option<JustifyContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_items: Option<AlignItems>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_self: Option<AlignItems>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_gap: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_gap: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_top: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_right: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_bottom: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_left: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_top: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_right: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_bottom: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_left: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Length>,

    // stacking and clipping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow: Option<Overflow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_mode: Option<MaskMode>,

    // box paint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_gradient: Option<Gradient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_top_left_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_top_right_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_bottom_right_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_bottom_left_radius: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,

    // path paint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_line_cap: Option<LineCap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_line_join: Option<LineJoin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_dash_array: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_dash_offset: Option<f32>,

    // filters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grayscale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invert: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sepia: Option<f32>,

    // shadow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_offset_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_offset_y: Option<f32>,

    // text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,

    // media
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_fit: Option<ObjectFit>,

    // transform (pivot at the box center)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_y: Option<f32>,
}

/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE: f32 = 32.0;
/// Default font family name passed to the text shaper.
pub const DEFAULT_FONT_FAMILY: &str = "default";

impl StyleConfig {
    /// Node opacity clamped to `0..=1` (default 1).
    pub fn opacity(&self) -> f32 {
        clamp_unit(self.opacity.unwrap_or(1.0))
    }

    /// Stacking order among siblings (default 0).
    pub fn z_index(&self) -> i32 {
        self.z_index.unwrap_or(0)
    }

    /// Mask mode (default alpha).
    pub fn mask_mode(&self) -> MaskMode {
        match self.mask_mode.unwrap_or_default() {
            MaskMode::Unknown => MaskMode::Alpha,
            m => m,
        }
    }

    /// Whether content is clipped to the border box.
    pub fn clips(&self) -> bool {
        self.overflow == Some(Overflow::Hidden)
    }

    /// Whether any of rotate/scale/skewX/skewY is set.
    pub fn has_transform(&self) -> bool {
        self.rotate.is_some() || self.scale.is_some() || self.skew_x.is_some() || self.skew_y.is_some()
    }

    /// Corner radii `[top-left, top-right, bottom-right, bottom-left]`, clamped to non-negative.
    pub fn corner_radii(&self) -> [f64; 4] {
        let base = self.border_radius.unwrap_or(0.0);
        [
            self.border_top_left_radius.unwrap_or(base),
            self.border_top_right_radius.unwrap_or(base),
            self.border_bottom_right_radius.unwrap_or(base),
            self.border_bottom_left_radius.unwrap_or(base),
        ]
        .map(|r| f64::from(non_negative(r)))
    }

    /// Font size in pixels (default 32).
    pub fn font_size(&self) -> f32 {
        self.font_size
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(DEFAULT_FONT_SIZE)
    }

    /// Line height in pixels (default `1.2 * fontSize`).
    pub fn line_height(&self) -> f32 {
        self.line_height
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(self.font_size() * 1.2)
    }

    /// Font family name (default `"default"`).
    pub fn font_family(&self) -> &str {
        self.font_family.as_deref().unwrap_or(DEFAULT_FONT_FAMILY)
    }
}

pub(crate) fn clamp_unit(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

pub(crate) fn non_negative(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/style.rs"]
mod tests;
