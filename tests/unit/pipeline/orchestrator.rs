use super::*;
use crate::encode::sink::InMemorySink;
use crate::scene::context::{FrameContext, StaticScene};
use crate::scene::model::SceneNode;

fn tiny(duration: f64) -> RenderConfig {
    RenderConfig {
        width: 2,
        height: 2,
        fps: 10,
        duration,
        ..RenderConfig::default()
    }
}

fn threads(n: usize) -> RenderThreading {
    RenderThreading {
        max_workers: DEFAULT_MAX_WORKERS,
        workers: Some(n),
    }
}

#[test]
fn partition_is_contiguous_and_covers_the_range() {
    for total in [1u64, 7, 10, 40, 41, 100] {
        for workers in 1..=8 {
            let chunks = partition_frames(total, workers);
            assert!(chunks.len() <= workers);
            assert_eq!(chunks[0].start, FrameIndex(0));
            assert_eq!(chunks.last().unwrap().end, FrameIndex(total));
            for pair in chunks.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            assert!(chunks.iter().all(|c| !c.is_empty()));
        }
    }
}

#[test]
fn partition_uses_ceil_sized_chunks_and_skips_empty_ones() {
    let chunks = partition_frames(40, 4);
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[2].start, FrameIndex(20));
    assert_eq!(chunks[2].end, FrameIndex(30));

    // ceil(9 / 8) = 2 gives five chunks; the last three would be empty.
    assert_eq!(partition_frames(9, 8).len(), 5);
    assert!(partition_frames(0, 4).is_empty());
}

#[test]
fn worker_count_is_capped() {
    let t = RenderThreading {
        max_workers: 3,
        workers: Some(16),
    };
    assert_eq!(t.worker_count(), 3);
    assert_eq!(threads(2).worker_count(), 2);
    let auto = RenderThreading {
        max_workers: 8,
        workers: None,
    };
    assert!((1..=8).contains(&auto.worker_count()));
}

#[test]
fn threading_validation_and_env_parsing() {
    assert!(threads(0).validate().is_err());
    assert!(
        RenderThreading {
            max_workers: 0,
            workers: None
        }
        .validate()
        .is_err()
    );
    assert_eq!(parse_max_workers(Some(" 12 ")), Some(12));
    assert_eq!(parse_max_workers(Some("0")), None);
    assert_eq!(parse_max_workers(Some("many")), None);
    assert_eq!(parse_max_workers(None), None);
}

#[test]
fn successful_sequence_closes_and_reports_progress() {
    let mut orch = Orchestrator::new(RenderResources::default()).with_threading(threads(3));
    assert_eq!(orch.state(), OrchestratorState::Idle);
    let mut sink = InMemorySink::new();
    let mut seen = Vec::new();
    let stats = orch
        .render_sequence_with_progress(
            &StaticScene(SceneNode::view()),
            &tiny(1.0),
            &mut sink,
            &mut |p| seen.push(p.flushed),
        )
        .unwrap();
    assert_eq!(
        stats,
        RenderStats {
            frames_total: 10,
            frames_flushed: 10,
            workers: 3
        }
    );
    assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    assert_eq!(orch.state(), OrchestratorState::Closed);
    assert!(sink.is_ended());
    assert_eq!(sink.bytes().len(), 10 * 16);
}

#[test]
fn empty_sequence_still_ends_the_sink() {
    let mut orch = Orchestrator::new(RenderResources::default()).with_threading(threads(2));
    let mut sink = InMemorySink::new();
    let stats = orch
        .render_sequence(&StaticScene(SceneNode::view()), &tiny(0.0), &mut sink)
        .unwrap();
    assert_eq!(stats.frames_flushed, 0);
    assert_eq!(stats.workers, 0);
    assert!(sink.is_ended());
}

#[test]
fn failure_moves_to_failed_state() {
    let failing = |ctx: &FrameContext| -> ScenecastResult<SceneNode> {
        let f = ctx.frame_index();
        if f == FrameIndex(7) {
            return Err(ScenecastError::layout("nope"));
        }
        // Keep the first chunk behind so the failure lands before frame 4 is flushed.
        if f < FrameIndex(5) {
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        Ok(SceneNode::view())
    };
    let mut orch = Orchestrator::new(RenderResources::default()).with_threading(threads(2));
    let mut sink = InMemorySink::new();
    let err = orch
        .render_sequence(&failing, &tiny(1.0), &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        ScenecastError::WorkerFatal {
            worker: 1,
            frame: 7,
            ..
        }
    ));
    assert_eq!(orch.state(), OrchestratorState::Failed);
    assert_eq!(
        sink.indices(),
        (0..5).map(FrameIndex).collect::<Vec<_>>().as_slice()
    );
    assert!(sink.is_ended());
}

#[test]
fn invalid_config_is_rejected_before_the_sink_starts() {
    let mut orch = Orchestrator::new(RenderResources::default());
    let mut sink = InMemorySink::new();
    let bad = RenderConfig {
        fps: 0,
        ..tiny(1.0)
    };
    assert!(matches!(
        orch.render_sequence(&StaticScene(SceneNode::view()), &bad, &mut sink),
        Err(ScenecastError::Validation(_))
    ));
    assert!(sink.config().is_none());
}

#[test]
fn registered_scenes_resolve_by_id() {
    let mut registry = SceneRegistry::new();
    registry.register("blank", std::sync::Arc::new(StaticScene(SceneNode::view())));
    let mut orch = Orchestrator::new(RenderResources::default()).with_threading(threads(1));
    let mut sink = InMemorySink::new();
    let stats = orch
        .render_registered(&registry, "blank", &tiny(0.5), &mut sink)
        .unwrap();
    assert_eq!(stats.frames_flushed, 5);
    assert!(
        orch.render_registered(&registry, "missing", &tiny(0.5), &mut sink)
            .is_err()
    );
}
