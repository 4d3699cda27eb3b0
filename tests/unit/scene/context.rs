use super::*;

#[test]
fn frame_index_rounds_half_up() {
    assert_eq!(FrameContext::new(3.0, 30).frame_index(), FrameIndex(3));
    assert_eq!(FrameContext::new(3.49, 30).frame_index(), FrameIndex(3));
    assert_eq!(FrameContext::new(3.5, 30).frame_index(), FrameIndex(4));
    assert_eq!(FrameContext::new(-2.0, 30).frame_index(), FrameIndex(0));
}

#[test]
fn sequence_offsets_compose() {
    let ctx = FrameContext::new(40.0, 30);
    let local = ctx.sequence(10.0, |c| c.sequence(5.0, |c| c.frame()));
    assert_eq!(local, 25.0);
    assert_eq!(ctx.frame(), 40.0);
    ctx.sequence(10.0, |c| assert_eq!(c.time(), 40.0));
}

#[test]
fn seconds_use_local_frame() {
    let ctx = FrameContext::new(45.0, 30);
    ctx.sequence(15.0, |c| assert!((c.seconds() - 1.0).abs() < 1e-9));
}

#[test]
fn closures_are_scene_sources() {
    let src = |ctx: &FrameContext| -> ScenecastResult<SceneNode> {
        Ok(SceneNode::text(format!("{}", ctx.frame_index().0)))
    };
    let node = src.scene_at(&FrameContext::new(7.0, 30)).unwrap();
    assert_eq!(
        node.kind,
        crate::scene::model::NodeKind::Text {
            text: "7".to_owned()
        }
    );
}

#[test]
fn registry_resolves_ids() {
    let mut reg = SceneRegistry::new();
    reg.register("intro", Arc::new(StaticScene(SceneNode::rect())));
    assert!(reg.get("intro").is_ok());
    assert!(matches!(
        reg.get("outro"),
        Err(ScenecastError::Validation(_))
    ));
    assert_eq!(reg.ids(), vec!["intro"]);
}

#[test]
fn path_length_of_square_outline() {
    let len = path_length("M0 0 L10 0 L10 10 L0 10 Z").unwrap();
    assert!((len - 40.0).abs() < 1e-6);
    assert!(path_length("not a path").is_none());
}
