use serde::{Deserialize, Serialize};

use crate::assets::RenderResources;
use crate::foundation::core::{FrameBuffer, FrameIndex};
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::render::compositor::Compositor;
use crate::render::surface::Surface;
use crate::scene::color::Color;
use crate::scene::context::{FrameContext, SceneSource};

/// Upper bound on motion-blur samples; `255 * 1024` stays exact in an `f32` accumulator.
pub const MAX_MOTION_BLUR_SAMPLES: u32 = 1024;

/// Output geometry, timing and motion-blur settings for a sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
    /// Sequence length in seconds.
    pub duration: f64,
    /// Sub-frame samples per frame; 0 and 1 disable motion blur.
    pub motion_blur_samples: u32,
    /// Shutter angle in degrees (`0..=360`); 360 exposes for the whole frame interval.
    pub shutter_angle: f64,
    /// Clear colour for every pass; transparent when unset.
    pub background: Option<Color>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            duration: 1.0,
            motion_blur_samples: 0,
            shutter_angle: 180.0,
            background: None,
        }
    }
}

impl RenderConfig {
    /// `ceil(fps * duration)`.
    pub fn total_frames(&self) -> u64 {
        let n = (f64::from(self.fps) * self.duration).ceil();
        if n.is_finite() && n > 0.0 { n as u64 } else { 0 }
    }

    /// Reject configurations no frame can be rendered with.
    pub fn validate(&self) -> ScenecastResult<()> {
        if !(1..=u32::from(u16::MAX)).contains(&self.width)
            || !(1..=u32::from(u16::MAX)).contains(&self.height)
        {
            return Err(ScenecastError::validation(format!(
                "frame size {}x{} must be within 1..=65535 on both axes",
                self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(ScenecastError::validation("fps must be non-zero"));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(ScenecastError::validation(
                "duration must be a finite, non-negative number of seconds",
            ));
        }
        if !(0.0..=360.0).contains(&self.shutter_angle) {
            return Err(ScenecastError::validation(
                "shutterAngle must be within 0..=360 degrees",
            ));
        }
        if self.motion_blur_samples > MAX_MOTION_BLUR_SAMPLES {
            return Err(ScenecastError::validation(format!(
                "motionBlurSamples must be <= {MAX_MOTION_BLUR_SAMPLES}"
            )));
        }
        Ok(())
    }
}

/// Renders single frames, averaging sub-frame samples when motion blur is on.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    compositor: Compositor,
}

impl FrameSampler {
    /// Sampler painting with `resources`.
    pub fn new(resources: RenderResources) -> Self {
        Self {
            compositor: Compositor::new(resources),
        }
    }

    /// Underlying compositor.
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Render frame `frame` of `scene` as premultiplied RGBA8.
    ///
    /// With `motion_blur_samples > 1`, sample `i` is built at time
    /// `frame + i * (shutter_angle / 360) / samples`, and the result is the per-byte average,
    /// rounded to nearest.
    #[tracing::instrument(level = "debug", skip_all, fields(frame = frame.0))]
    pub fn render_frame(
        &self,
        scene: &dyn SceneSource,
        config: &RenderConfig,
        frame: FrameIndex,
    ) -> ScenecastResult<FrameBuffer> {
        config.validate()?;
        let samples = config.motion_blur_samples;
        let base = frame.0 as f64;
        if samples <= 1 {
            return Ok(self.render_pass(scene, config, base)?.into_frame());
        }

        let step = config.shutter_angle / 360.0 / f64::from(samples);
        let mut acc = vec![0f32; FrameBuffer::byte_len(config.width, config.height)];
        for i in 0..samples {
            let pass = self.render_pass(scene, config, base + f64::from(i) * step)?;
            for (a, b) in acc.iter_mut().zip(pass.data()) {
                *a += f32::from(*b);
            }
        }

        let n = samples as f32;
        Ok(FrameBuffer {
            width: config.width,
            height: config.height,
            data: acc
                .into_iter()
                .map(|v| (v / n).round().clamp(0.0, 255.0) as u8)
                .collect(),
            premultiplied: true,
        })
    }

    fn render_pass(
        &self,
        scene: &dyn SceneSource,
        config: &RenderConfig,
        time: f64,
    ) -> ScenecastResult<Surface> {
        let ctx = FrameContext::new(time, config.fps);
        let tree = scene.scene_at(&ctx)?;
        let layout = self.compositor.resources().layout.compute_layout(
            &tree,
            config.width as f32,
            config.height as f32,
        )?;
        let mut surface = Surface::new(config.width, config.height)?;
        surface.clear(config.background);
        self.compositor
            .paint(&tree, &layout, &mut surface, ctx.frame_index())?;
        Ok(surface)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/sampler.rs"]
mod tests;
