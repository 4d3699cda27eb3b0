//! Encoding sinks.
//!
//! Sinks consume rendered frames in strict frame order; the orchestrator is their only writer.

/// `ffmpeg` child-process sink.
pub mod ffmpeg;
/// Frame sink trait and built-in sinks.
pub mod sink;

pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use sink::{FrameSink, InMemorySink, SinkConfig, SinkExit, WriterSink};
