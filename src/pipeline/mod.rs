//! Parallel sequence rendering: chunked workers, in-order reassembly and sink streaming.

/// Sequence driver and threading controls.
pub mod orchestrator;
/// Out-of-order frame holding area.
pub mod reorder;
pub(crate) mod worker;

pub use orchestrator::{
    Orchestrator, OrchestratorState, RenderProgress, RenderStats, RenderThreading,
    partition_frames,
};
pub use reorder::ReorderBuffer;
