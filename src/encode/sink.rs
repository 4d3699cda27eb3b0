use std::io::Write;

use crate::foundation::core::{FrameBuffer, FrameIndex};
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::render::sampler::RenderConfig;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: u32,
}

impl From<&RenderConfig> for SinkConfig {
    fn from(cfg: &RenderConfig) -> Self {
        Self {
            width: cfg.width,
            height: cfg.height,
            fps: cfg.fps,
        }
    }
}

/// How a sink's consumer finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkExit {
    /// Whether the consumer reported success.
    pub success: bool,
    /// Exit status text (e.g. a process exit code).
    pub status: String,
    /// Captured diagnostic output.
    pub diagnostics: String,
}

impl SinkExit {
    /// Clean exit with no diagnostics.
    pub fn ok() -> Self {
        Self {
            success: true,
            status: "ok".to_owned(),
            diagnostics: String::new(),
        }
    }
}

/// Ordered consumer of rendered frames.
///
/// Ordering contract: `write_frame` is called in strictly increasing [`FrameIndex`] order, once
/// per frame, and only by the orchestrator loop. `end` closes the input; `wait` blocks until the
/// consumer has finished and reports how it exited.
pub trait FrameSink: Send {
    /// Called once before any frame is written.
    fn begin(&mut self, cfg: SinkConfig) -> ScenecastResult<()>;
    /// Write one whole frame.
    fn write_frame(&mut self, idx: FrameIndex, frame: &FrameBuffer) -> ScenecastResult<()>;
    /// Close the input stream.
    fn end(&mut self) -> ScenecastResult<()>;
    /// Wait for the consumer to finish.
    fn wait(&mut self) -> ScenecastResult<SinkExit>;
}

/// Reject frames that break ordering or do not match the configured size.
pub(crate) fn check_frame(
    cfg: Option<&SinkConfig>,
    last: Option<FrameIndex>,
    idx: FrameIndex,
    frame: &FrameBuffer,
) -> ScenecastResult<()> {
    let cfg = cfg.ok_or_else(|| ScenecastError::sink_write("sink not started"))?;
    if let Some(last) = last
        && idx <= last
    {
        return Err(ScenecastError::sink_write(format!(
            "out-of-order frame {} after {}",
            idx.0, last.0
        )));
    }
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(ScenecastError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    if frame.data.len() != FrameBuffer::byte_len(cfg.width, cfg.height) {
        return Err(ScenecastError::validation(
            "frame.data size mismatch with width*height*4",
        ));
    }
    Ok(())
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    bytes: Vec<u8>,
    indices: Vec<FrameIndex>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Concatenated frame bytes in write order.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Indices of the written frames, in write order.
    pub fn indices(&self) -> &[FrameIndex] {
        &self.indices
    }

    /// Whether `end` was called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ScenecastResult<()> {
        self.cfg = Some(cfg);
        self.bytes.clear();
        self.indices.clear();
        self.ended = false;
        Ok(())
    }

    fn write_frame(&mut self, idx: FrameIndex, frame: &FrameBuffer) -> ScenecastResult<()> {
        check_frame(self.cfg.as_ref(), self.indices.last().copied(), idx, frame)?;
        self.bytes.extend_from_slice(&frame.data);
        self.indices.push(idx);
        Ok(())
    }

    fn end(&mut self) -> ScenecastResult<()> {
        self.ended = true;
        Ok(())
    }

    fn wait(&mut self) -> ScenecastResult<SinkExit> {
        Ok(SinkExit::ok())
    }
}

/// Streams raw premultiplied RGBA8 frames into any writer, e.g. a `.rgba` file.
#[derive(Debug)]
pub struct WriterSink<W: Write + Send> {
    writer: W,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    frames: u64,
}

impl<W: Write + Send> WriterSink<W> {
    /// Sink writing into `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            cfg: None,
            last_idx: None,
            frames: 0,
        }
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> FrameSink for WriterSink<W> {
    fn begin(&mut self, cfg: SinkConfig) -> ScenecastResult<()> {
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames = 0;
        Ok(())
    }

    fn write_frame(&mut self, idx: FrameIndex, frame: &FrameBuffer) -> ScenecastResult<()> {
        check_frame(self.cfg.as_ref(), self.last_idx, idx, frame)?;
        self.writer
            .write_all(&frame.data)
            .map_err(|e| ScenecastError::sink_write(format!("failed to write frame {}: {e}", idx.0)))?;
        self.last_idx = Some(idx);
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> ScenecastResult<()> {
        self.writer
            .flush()
            .map_err(|e| ScenecastError::sink_write(format!("failed to flush output: {e}")))
    }

    fn wait(&mut self) -> ScenecastResult<SinkExit> {
        Ok(SinkExit::ok())
    }
}
