use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;

use crate::foundation::core::{FrameBuffer, FrameIndex, FrameRange};
use crate::render::sampler::{FrameSampler, RenderConfig};
use crate::scene::context::SceneSource;

/// What a worker reports to the orchestrator loop.
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    Frame {
        index: FrameIndex,
        frame: FrameBuffer,
    },
    Done {
        worker: usize,
    },
    Cancelled {
        worker: usize,
        at: FrameIndex,
    },
    Error {
        worker: usize,
        frame: FrameIndex,
        message: String,
    },
}

/// Lowest frame index that must no longer be produced; `u64::MAX` while nothing failed.
#[derive(Debug)]
pub(crate) struct AbortPoint(AtomicU64);

impl AbortPoint {
    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(u64::MAX))
    }

    /// Lower the abort point to `start` (never raises it).
    pub(crate) fn set(&self, start: FrameIndex) {
        self.0.fetch_min(start.0, Ordering::SeqCst);
    }

    pub(crate) fn get(&self) -> Option<FrameIndex> {
        match self.0.load(Ordering::SeqCst) {
            u64::MAX => None,
            f => Some(FrameIndex(f)),
        }
    }

    /// Whether `frame` lies at or beyond the abort point.
    pub(crate) fn covers(&self, frame: FrameIndex) -> bool {
        frame.0 >= self.0.load(Ordering::SeqCst)
    }
}

/// Render `chunk` in ascending order, sending one `Frame` per frame and exactly one terminal
/// message.
///
/// A render error or panic at frame `f` lowers `abort` to the chunk start and ends the worker
/// with `Error`. The abort point is checked before every frame.
pub(crate) fn run_worker(
    worker: usize,
    chunk: FrameRange,
    scene: &dyn SceneSource,
    config: &RenderConfig,
    sampler: &FrameSampler,
    abort: &AbortPoint,
    tx: &SyncSender<WorkerMessage>,
) {
    tracing::debug!(
        worker,
        start = chunk.start.0,
        end = chunk.end.0,
        "worker started"
    );
    for index in chunk.iter() {
        if abort.covers(index) {
            tracing::debug!(worker, frame = index.0, "worker cancelled");
            let _ = tx.send(WorkerMessage::Cancelled { worker, at: index });
            return;
        }

        let rendered = catch_unwind(AssertUnwindSafe(|| {
            sampler.render_frame(scene, config, index)
        }));
        let message = match rendered {
            Ok(Ok(frame)) => {
                if tx.send(WorkerMessage::Frame { index, frame }).is_err() {
                    return;
                }
                continue;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        abort.set(chunk.start);
        let _ = tx.send(WorkerMessage::Error {
            worker,
            frame: index,
            message,
        });
        return;
    }
    let _ = tx.send(WorkerMessage::Done { worker });
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with a non-string payload".to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/worker.rs"]
mod tests;
