//! CPU compositing: surfaces, blend and filter kernels, the tree painter and the frame sampler.
//!
//! Everything here works on premultiplied RGBA8. Shapes go through `vello_cpu` for coverage;
//! compositing happens on the bytes.

/// Blend-mode and Porter-Duff kernels.
pub mod blend;
/// Recursive scene painter.
pub mod compositor;
/// Blur and colour filter chain.
pub mod filters;
/// Fill and stroke descriptions.
pub mod paint;
pub(crate) mod raster;
/// Single-frame rendering with motion blur.
pub mod sampler;
/// Pixel buffer with a paint state stack.
pub mod surface;

pub use compositor::Compositor;
pub use sampler::{FrameSampler, MAX_MOTION_BLUR_SAMPLES, RenderConfig};
pub use surface::Surface;
