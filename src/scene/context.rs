use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::{BezPath, FrameIndex};
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::scene::model::SceneNode;

/// Time value handed to a scene source for one render pass.
///
/// `time` is the global frame position and may be fractional during motion-blur sub-sampling.
/// Sequences shift the local frame seen by nested builders without touching the global time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    time: f64,
    fps: u32,
    offset: f64,
}

impl FrameContext {
    /// Context at global frame position `time`.
    pub fn new(time: f64, fps: u32) -> Self {
        Self {
            time,
            fps,
            offset: 0.0,
        }
    }

    /// Context at an integer frame.
    pub fn at_frame(frame: FrameIndex, fps: u32) -> Self {
        Self::new(frame.0 as f64, fps)
    }

    /// Global frame position, possibly fractional.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Frame position relative to the innermost sequence start.
    pub fn frame(&self) -> f64 {
        self.time - self.offset
    }

    /// Integer frame used for lookups such as video frames.
    ///
    /// Fractional times snap with round half up.
    pub fn frame_index(&self) -> FrameIndex {
        snap_frame(self.time)
    }

    /// Frames per second of the sequence.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Local time in seconds.
    pub fn seconds(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.frame() / f64::from(self.fps)
    }

    /// Run `f` inside a sequence starting at local frame `from`.
    pub fn sequence<R>(&self, from: f64, f: impl FnOnce(&FrameContext) -> R) -> R {
        let inner = Self {
            offset: self.offset + from,
            ..*self
        };
        f(&inner)
    }
}

/// Round half up, clamped at zero.
pub fn snap_frame(time: f64) -> FrameIndex {
    if !time.is_finite() || time <= 0.0 {
        return FrameIndex(0);
    }
    FrameIndex((time + 0.5).floor() as u64)
}

/// Builds the scene tree for a given frame context.
///
/// Implementations must be pure functions of the context: workers call them concurrently and
/// motion blur calls them several times per frame.
pub trait SceneSource: Send + Sync {
    /// Build the tree for `ctx`.
    fn scene_at(&self, ctx: &FrameContext) -> ScenecastResult<SceneNode>;
}

impl<F> SceneSource for F
where
    F: Fn(&FrameContext) -> ScenecastResult<SceneNode> + Send + Sync,
{
    fn scene_at(&self, ctx: &FrameContext) -> ScenecastResult<SceneNode> {
        self(ctx)
    }
}

/// A time-invariant scene.
#[derive(Debug, Clone)]
pub struct StaticScene(pub SceneNode);

impl SceneSource for StaticScene {
    fn scene_at(&self, _ctx: &FrameContext) -> ScenecastResult<SceneNode> {
        Ok(self.0.clone())
    }
}

/// Table of scene sources addressable by id.
#[derive(Default, Clone)]
pub struct SceneRegistry {
    scenes: HashMap<String, Arc<dyn SceneSource>>,
}

impl SceneRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `scene` under `id`, replacing any previous entry.
    pub fn register(&mut self, id: impl Into<String>, scene: Arc<dyn SceneSource>) {
        self.scenes.insert(id.into(), scene);
    }

    /// Look up the source registered under `id`.
    pub fn get(&self, id: &str) -> ScenecastResult<Arc<dyn SceneSource>> {
        self.scenes
            .get(id)
            .cloned()
            .ok_or_else(|| ScenecastError::validation(format!("no scene registered as '{id}'")))
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.scenes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

/// Arc length of SVG path data, or `None` when it does not parse.
pub fn path_length(d: &str) -> Option<f64> {
    use kurbo::Shape as _;

    BezPath::from_svg(d.trim()).ok().map(|p| p.perimeter(0.1))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/context.rs"]
mod tests;
