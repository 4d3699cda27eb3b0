use std::sync::mpsc::sync_channel;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assets::RenderResources;
use crate::encode::sink::{FrameSink, SinkConfig, SinkExit};
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::pipeline::reorder::ReorderBuffer;
use crate::pipeline::worker::{AbortPoint, WorkerMessage, run_worker};
use crate::render::sampler::{FrameSampler, RenderConfig};
use crate::scene::context::{SceneRegistry, SceneSource};

/// Default ceiling on concurrent workers.
pub const DEFAULT_MAX_WORKERS: usize = 8;
/// Environment variable overriding [`DEFAULT_MAX_WORKERS`].
pub const MAX_WORKERS_ENV: &str = "SCENECAST_MAX_WORKERS";

/// Worker count controls for sequence rendering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderThreading {
    /// Hard ceiling on workers.
    pub max_workers: usize,
    /// Explicit worker count (still capped by `max_workers`); defaults to the available
    /// parallelism.
    pub workers: Option<usize>,
}

impl Default for RenderThreading {
    /// `max_workers` comes from `SCENECAST_MAX_WORKERS` when set to a positive integer.
    fn default() -> Self {
        Self {
            max_workers: parse_max_workers(std::env::var(MAX_WORKERS_ENV).ok().as_deref())
                .unwrap_or(DEFAULT_MAX_WORKERS),
            workers: None,
        }
    }
}

impl RenderThreading {
    /// Force exactly `n` workers (capped by `max_workers`).
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = Some(n);
        self
    }

    /// Reject zero worker counts.
    pub fn validate(&self) -> ScenecastResult<()> {
        if self.max_workers == 0 {
            return Err(ScenecastError::validation("maxWorkers must be >= 1"));
        }
        if self.workers == Some(0) {
            return Err(ScenecastError::validation("workers must be >= 1 when set"));
        }
        Ok(())
    }

    /// `min(workers or available parallelism, max_workers)`, at least 1.
    pub fn worker_count(&self) -> usize {
        let wanted = self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        wanted.min(self.max_workers).max(1)
    }
}

fn parse_max_workers(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// Split `[0, total)` into contiguous chunks of `ceil(total / workers)`, skipping empty ones.
pub fn partition_frames(total: u64, workers: usize) -> Vec<FrameRange> {
    let workers = workers.max(1) as u64;
    let size = total.div_ceil(workers).max(1);
    (0..workers)
        .map(|i| {
            let start = (i * size).min(total);
            let end = ((i + 1) * size).min(total);
            FrameRange {
                start: FrameIndex(start),
                end: FrameIndex(end),
            }
        })
        .filter(|r| !r.is_empty())
        .collect()
}

/// Orchestrator lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrchestratorState {
    /// Not rendering.
    Idle,
    /// Workers are being started.
    Dispatching,
    /// Receiving and flushing frames.
    Draining,
    /// Sink ended after a successful sequence.
    Closed,
    /// The last sequence failed.
    Failed,
}

/// Counters for a finished sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames in the sequence.
    pub frames_total: u64,
    /// Frames written to the sink.
    pub frames_flushed: u64,
    /// Workers used.
    pub workers: usize,
}

/// Progress reported after every flushed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderProgress {
    /// Frames flushed so far (the flush cursor).
    pub flushed: u64,
    /// Frames in the sequence.
    pub total: u64,
}

impl RenderProgress {
    /// `flushed / total` in `0..=1`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.flushed as f64 / self.total as f64
        }
    }
}

/// Renders frame sequences on parallel workers and streams them to a sink in frame order.
#[derive(Debug)]
pub struct Orchestrator {
    resources: RenderResources,
    threading: RenderThreading,
    state: OrchestratorState,
}

impl Orchestrator {
    /// Orchestrator with default threading.
    pub fn new(resources: RenderResources) -> Self {
        Self {
            resources,
            threading: RenderThreading::default(),
            state: OrchestratorState::Idle,
        }
    }

    /// Replace the threading controls.
    pub fn with_threading(mut self, threading: RenderThreading) -> Self {
        self.threading = threading;
        self
    }

    /// Threading controls in use.
    pub fn threading(&self) -> &RenderThreading {
        &self.threading
    }

    /// Current lifecycle state.
    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    fn transition(&mut self, to: OrchestratorState) {
        debug!(from = ?self.state, to = ?to, "orchestrator state");
        self.state = to;
    }

    /// Render every frame of `scene` into `sink`.
    pub fn render_sequence(
        &mut self,
        scene: &dyn SceneSource,
        config: &RenderConfig,
        sink: &mut dyn FrameSink,
    ) -> ScenecastResult<RenderStats> {
        self.render_sequence_with_progress(scene, config, sink, &mut |_| {})
    }

    /// Resolve `id` in `registry`, then render it like [`Self::render_sequence`].
    pub fn render_registered(
        &mut self,
        registry: &SceneRegistry,
        id: &str,
        config: &RenderConfig,
        sink: &mut dyn FrameSink,
    ) -> ScenecastResult<RenderStats> {
        let scene = registry.get(id)?;
        self.render_sequence(scene.as_ref(), config, sink)
    }

    /// Render every frame of `scene` into `sink`, calling `progress` after each flushed frame.
    ///
    /// Frames reach the sink strictly in index order, one `write_frame` per frame. When a
    /// worker fails, frames before its chunk start are still flushed, the sink is ended and
    /// awaited, and a single [`ScenecastError::WorkerFatal`] is returned.
    #[tracing::instrument(level = "info", skip_all, fields(fps = config.fps, duration = config.duration))]
    pub fn render_sequence_with_progress(
        &mut self,
        scene: &dyn SceneSource,
        config: &RenderConfig,
        sink: &mut dyn FrameSink,
        progress: &mut dyn FnMut(RenderProgress),
    ) -> ScenecastResult<RenderStats> {
        config.validate()?;
        self.threading.validate()?;

        let total = config.total_frames();
        let chunks = partition_frames(total, self.threading.worker_count());
        let mut stats = RenderStats {
            frames_total: total,
            frames_flushed: 0,
            workers: chunks.len(),
        };
        info!(total, workers = chunks.len(), "rendering sequence");

        self.transition(OrchestratorState::Dispatching);
        if let Err(e) = sink.begin(SinkConfig::from(config)) {
            self.transition(OrchestratorState::Failed);
            return Err(e);
        }
        let pool = match build_thread_pool(chunks.len()) {
            Ok(pool) => pool,
            Err(e) => {
                self.transition(OrchestratorState::Failed);
                return Err(e);
            }
        };

        let abort = AbortPoint::new();
        let (tx, rx) = sync_channel::<WorkerMessage>(2 * chunks.len().max(1));
        let mut drain = Drain {
            reorder: ReorderBuffer::new(),
            total,
            flushed: 0,
            fatal: None,
            sink_error: None,
        };

        pool.in_place_scope(|s| {
            for (worker, &chunk) in chunks.iter().enumerate() {
                let tx = tx.clone();
                let sampler = FrameSampler::new(self.resources.clone());
                let abort = &abort;
                s.spawn(move |_| run_worker(worker, chunk, scene, config, &sampler, abort, &tx));
            }
            drop(tx);

            self.transition(OrchestratorState::Draining);
            for msg in rx.iter() {
                drain.handle(msg, &chunks, &abort, sink, progress);
            }
        });

        if let Some(at) = abort.get() {
            debug!(abort_at = at.0, flushed = drain.flushed, "sequence aborted");
        }
        if let Err(e) = sink.end() {
            warn!(error = %e, "sink end failed");
            drain.sink_error.get_or_insert(e);
        }
        let exit = sink.wait();
        stats.frames_flushed = drain.flushed;

        let out = finish(drain, exit, &stats);
        self.transition(if out.is_ok() {
            OrchestratorState::Closed
        } else {
            OrchestratorState::Failed
        });
        if out.is_ok() {
            info!(flushed = stats.frames_flushed, "sequence complete");
        }
        out
    }
}

struct WorkerFailure {
    worker: usize,
    frame: FrameIndex,
    message: String,
}

struct Drain {
    reorder: ReorderBuffer,
    total: u64,
    flushed: u64,
    fatal: Option<WorkerFailure>,
    sink_error: Option<ScenecastError>,
}

impl Drain {
    fn handle(
        &mut self,
        msg: WorkerMessage,
        chunks: &[FrameRange],
        abort: &AbortPoint,
        sink: &mut dyn FrameSink,
        progress: &mut dyn FnMut(RenderProgress),
    ) {
        match msg {
            WorkerMessage::Frame { index, frame } => {
                if abort.covers(index) {
                    return;
                }
                if !self.reorder.insert(index, frame) {
                    warn!(frame = index.0, "dropping duplicate or stale frame");
                    return;
                }
                self.flush_ready(abort, sink, progress);
            }
            WorkerMessage::Done { worker } => debug!(worker, "worker done"),
            WorkerMessage::Cancelled { worker, at } => {
                debug!(worker, frame = at.0, "worker stopped at abort point");
            }
            WorkerMessage::Error {
                worker,
                frame,
                message,
            } => {
                let start = chunks.get(worker).map_or(frame, |c| c.start);
                abort.set(start);
                let dropped = self.reorder.discard_from(start);
                warn!(worker, frame = frame.0, dropped, error = %message, "worker failed");
                if self.fatal.as_ref().is_none_or(|f| frame < f.frame) {
                    self.fatal = Some(WorkerFailure {
                        worker,
                        frame,
                        message,
                    });
                }
            }
        }
    }

    fn flush_ready(
        &mut self,
        abort: &AbortPoint,
        sink: &mut dyn FrameSink,
        progress: &mut dyn FnMut(RenderProgress),
    ) {
        while let Some((index, frame)) = self.reorder.pop_ready() {
            // A worker may have failed after this frame was buffered.
            if abort.covers(index) {
                self.reorder.discard_from(index);
                return;
            }
            if self.sink_error.is_some() {
                continue;
            }
            match sink.write_frame(index, &frame) {
                Ok(()) => {
                    self.flushed += 1;
                    progress(RenderProgress {
                        flushed: self.flushed,
                        total: self.total,
                    });
                }
                Err(e) => {
                    warn!(frame = index.0, error = %e, "sink write failed; dropping remaining frames");
                    self.sink_error = Some(e);
                }
            }
        }
    }
}

/// Pick the single error to report: worker failure, then encoder exit, then sink write, then
/// a short stream.
fn finish(
    drain: Drain,
    exit: ScenecastResult<SinkExit>,
    stats: &RenderStats,
) -> ScenecastResult<RenderStats> {
    if let Some(f) = drain.fatal {
        if let Ok(exit) = &exit
            && !exit.success
        {
            warn!(status = %exit.status, diagnostics = %exit.diagnostics, "encoder also failed");
        }
        return Err(ScenecastError::WorkerFatal {
            worker: f.worker,
            frame: f.frame.0,
            message: f.message,
        });
    }

    let exit = exit?;
    if !exit.success {
        return Err(ScenecastError::EncoderExit {
            status: exit.status,
            diagnostics: exit.diagnostics,
        });
    }
    if let Some(e) = drain.sink_error {
        return Err(match e {
            ScenecastError::SinkWrite(_) => e,
            other => ScenecastError::sink_write(other.to_string()),
        });
    }
    if stats.frames_flushed < stats.frames_total {
        return Err(ScenecastError::IncompleteStream {
            flushed: stats.frames_flushed,
            total: stats.frames_total,
        });
    }
    Ok(*stats)
}

fn build_thread_pool(threads: usize) -> ScenecastResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("scenecast-worker-{i}"))
        .build()
        .map_err(|e| ScenecastError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
