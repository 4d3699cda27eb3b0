//! scenecast renders declarative scene trees into ordered raw frame streams.
//!
//! A caller describes each frame as a tree of styled [`SceneNode`]s, built from a
//! [`FrameContext`] by a [`SceneSource`]. The crate is organised around two pieces:
//!
//! - the [`Compositor`], which paints one laid-out tree onto a premultiplied RGBA8 [`Surface`]
//!   (transforms, opacity, blend modes, filters, clipping, masks, z-order), driven per frame by
//!   the [`FrameSampler`] with optional motion blur;
//! - the [`Orchestrator`], which renders contiguous frame chunks on parallel workers and streams
//!   the results to a [`FrameSink`] strictly in frame order.
//!
//! Layout, assets, glyphs and video frames come in through narrow provider traits bundled in
//! [`RenderResources`]; defaults backed by `taffy` and the `image` crate are included.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Image, video frame and glyph providers.
pub mod assets;
/// Frame sinks.
pub mod encode;
/// Scene tree to box tree.
pub mod layout;
/// Parallel sequence rendering.
pub mod pipeline;
/// CPU compositing and frame sampling.
pub mod render;
/// Scene model.
pub mod scene;

pub use crate::foundation::core::{
    Affine, BezPath, FrameBuffer, FrameIndex, FrameRange, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{ScenecastError, ScenecastResult};

pub use crate::assets::{
    AssetProvider, AssetStore, FrameSource, ImageData, NoFonts, RenderResources, TextShaper,
};
pub use crate::encode::{
    FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, SinkConfig, SinkExit, WriterSink,
};
pub use crate::layout::taffy_bridge::TaffyLayout;
pub use crate::layout::{LayoutBox, LayoutProvider, LayoutTree};
pub use crate::pipeline::{
    Orchestrator, OrchestratorState, RenderProgress, RenderStats, RenderThreading,
};
pub use crate::render::{Compositor, FrameSampler, RenderConfig, Surface};
pub use crate::scene::color::Color;
pub use crate::scene::context::{FrameContext, SceneRegistry, SceneSource, StaticScene};
pub use crate::scene::model::{NodeKind, SceneNode};
pub use crate::scene::style::{BlendMode, Gradient, Length, MaskMode, StyleConfig};
