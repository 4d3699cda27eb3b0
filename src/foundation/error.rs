/// Convenience result type used across scenecast.
pub type ScenecastResult<T> = Result<T, ScenecastError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ScenecastError {
    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// The layout provider could not produce boxes for a scene.
    #[error("layout error: {0}")]
    Layout(String),

    /// A frame could not be painted because its inputs are structurally unsafe.
    #[error("compositing error: {0}")]
    Compositing(String),

    /// A worker failed while rendering its chunk; the whole sequence was aborted.
    #[error("worker {worker} failed at frame {frame}: {message}")]
    WorkerFatal {
        /// Worker id (chunk position).
        worker: usize,
        /// Frame being rendered when the worker failed.
        frame: u64,
        /// Error text or panic payload.
        message: String,
    },

    /// Writing into the sink failed while the encoder itself exited cleanly.
    #[error("sink write error: {0}")]
    SinkWrite(String),

    /// The external encoder exited unsuccessfully.
    #[error("encoder exited with {status}: {diagnostics}")]
    EncoderExit {
        /// Exit status as reported by the encoder.
        status: String,
        /// Captured diagnostic output.
        diagnostics: String,
    },

    /// Every worker finished but the stream is missing frames.
    #[error("incomplete stream: flushed {flushed} of {total} frames")]
    IncompleteStream {
        /// Frames delivered to the sink.
        flushed: u64,
        /// Frames expected.
        total: u64,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScenecastError {
    /// Build a [`ScenecastError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScenecastError::Layout`] value.
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Build a [`ScenecastError::Compositing`] value.
    pub fn compositing(msg: impl Into<String>) -> Self {
        Self::Compositing(msg.into())
    }

    /// Build a [`ScenecastError::SinkWrite`] value.
    pub fn sink_write(msg: impl Into<String>) -> Self {
        Self::SinkWrite(msg.into())
    }

    /// Build a [`ScenecastError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ScenecastError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
