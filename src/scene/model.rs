use serde::{Deserialize, Serialize};

use crate::foundation::error::ScenecastResult;
use crate::scene::style::StyleConfig;

/// What a node draws beyond its box background and border.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Plain container.
    View,
    /// Text run laid out inside the box.
    Text {
        /// Text content; `\n` starts a new line.
        text: String,
    },
    /// Still image looked up from the asset provider.
    Image {
        /// Asset id.
        src: String,
    },
    /// Video frame looked up from the frame source.
    Video {
        /// Video source id.
        src: String,
    },
    /// Circle inscribed in the box.
    Circle,
    /// Ellipse inscribed in the box.
    Ellipse,
    /// Rectangle filling the box.
    Rect,
    /// SVG path in node-local coordinates.
    Path {
        /// SVG path data.
        d: String,
    },
    /// Unrecognized tag; skipped together with its subtree.
    Unknown(String),
}

impl NodeKind {
    /// Serialized tag name.
    pub fn tag(&self) -> &str {
        match self {
            Self::View => "view",
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Video { .. } => "video",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Rect => "rect",
            Self::Path { .. } => "path",
            Self::Unknown(tag) => tag,
        }
    }
}

/// One node of the per-frame scene tree.
///
/// Trees are owned values built fresh per frame: children and the optional mask are held by
/// value, so a tree is always finite and acyclic and a mask can never reference its host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct SceneNode {
    /// Node kind and its payload.
    pub kind: NodeKind,
    /// Layout and paint style.
    pub style: StyleConfig,
    /// Children in declaration order.
    pub children: Vec<SceneNode>,
    /// Optional mask subtree gating this node's content.
    pub mask: Option<Box<SceneNode>>,
}

impl SceneNode {
    /// New node of `kind` with default style and no children.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            style: StyleConfig::default(),
            children: Vec::new(),
            mask: None,
        }
    }

    /// `view` container.
    pub fn view() -> Self {
        Self::new(NodeKind::View)
    }

    /// `rect` node.
    pub fn rect() -> Self {
        Self::new(NodeKind::Rect)
    }

    /// `circle` node.
    pub fn circle() -> Self {
        Self::new(NodeKind::Circle)
    }

    /// `ellipse` node.
    pub fn ellipse() -> Self {
        Self::new(NodeKind::Ellipse)
    }

    /// `text` node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text { text: text.into() })
    }

    /// `image` node.
    pub fn image(src: impl Into<String>) -> Self {
        Self::new(NodeKind::Image { src: src.into() })
    }

    /// `video` node.
    pub fn video(src: impl Into<String>) -> Self {
        Self::new(NodeKind::Video { src: src.into() })
    }

    /// `path` node.
    pub fn path(d: impl Into<String>) -> Self {
        Self::new(NodeKind::Path { d: d.into() })
    }

    /// Replace the style.
    pub fn with_style(mut self, style: StyleConfig) -> Self {
        self.style = style;
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = SceneNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Attach a mask subtree.
    pub fn with_mask(mut self, mask: SceneNode) -> Self {
        self.mask = Some(Box::new(mask));
        self
    }

    /// Number of nodes in this subtree, masks included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
            + self.mask.as_ref().map_or(0, |m| m.node_count())
    }

    /// Parse a scene tree from JSON text.
    pub fn from_json_str(s: &str) -> ScenecastResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    d: Option<String>,
    #[serde(default)]
    style: StyleConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<SceneNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mask: Option<Box<SceneNode>>,
}

impl From<RawNode> for SceneNode {
    fn from(raw: RawNode) -> Self {
        let kind = match raw.tag.as_str() {
            "view" => NodeKind::View,
            "text" => NodeKind::Text {
                text: raw.text.unwrap_or_default(),
            },
            "image" => NodeKind::Image {
                src: raw.src.unwrap_or_default(),
            },
            "video" => NodeKind::Video {
                src: raw.src.unwrap_or_default(),
            },
            "circle" => NodeKind::Circle,
            "ellipse" => NodeKind::Ellipse,
            "rect" => NodeKind::Rect,
            "path" => NodeKind::Path {
                d: raw.d.unwrap_or_default(),
            },
            _ => NodeKind::Unknown(raw.tag),
        };
        Self {
            kind,
            style: raw.style,
            children: raw.children,
            mask: raw.mask,
        }
    }
}

impl From<SceneNode> for RawNode {
    fn from(node: SceneNode) -> Self {
        let tag = node.kind.tag().to_owned();
        let (text, src, d) = match node.kind {
            NodeKind::Text { text } => (Some(text), None, None),
            NodeKind::Image { src } | NodeKind::Video { src } => (None, Some(src), None),
            NodeKind::Path { d } => (None, None, Some(d)),
            _ => (None, None, None),
        };
        Self {
            tag,
            text,
            src,
            d,
            style: node.style,
            children: node.children,
            mask: node.mask,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
