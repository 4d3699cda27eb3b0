//! Layout boundary: the compositor consumes a box tree aligned with the scene tree.

use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::scene::model::SceneNode;

/// Flexbox provider backed by `taffy`.
pub mod taffy_bridge;

/// One node's box, relative to its parent's box origin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LayoutBox {
    /// Left edge relative to the parent.
    pub x: f32,
    /// Top edge relative to the parent.
    pub y: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
}

impl LayoutBox {
    /// Box at `(x, y)` with size `width x height`.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Box tree whose topology mirrors a scene tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutTree {
    /// This node's box.
    pub bx: LayoutBox,
    /// Child boxes in scene declaration order.
    pub children: Vec<LayoutTree>,
}

impl LayoutTree {
    /// Leaf tree with a single box.
    pub fn leaf(bx: LayoutBox) -> Self {
        Self {
            bx,
            children: Vec::new(),
        }
    }

    /// Verify that this tree has exactly the shape of `scene` (masks excluded).
    pub fn check_topology(&self, scene: &SceneNode) -> ScenecastResult<()> {
        if self.children.len() != scene.children.len() {
            return Err(ScenecastError::compositing(format!(
                "layout topology mismatch at '{}': {} boxes for {} children",
                scene.kind.tag(),
                self.children.len(),
                scene.children.len()
            )));
        }
        for (l, n) in self.children.iter().zip(&scene.children) {
            l.check_topology(n)?;
        }
        Ok(())
    }
}

/// Computes a [`LayoutTree`] for a scene inside a `width x height` container.
///
/// Providers are shared read-only across workers.
pub trait LayoutProvider: Send + Sync {
    /// Lay out `scene` against the container size.
    fn compute_layout(&self, scene: &SceneNode, width: f32, height: f32)
    -> ScenecastResult<LayoutTree>;
}
