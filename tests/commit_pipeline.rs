use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::Context;

use egui::{Pos2, pos2, vec2};
use futures::channel::oneshot;
use futures::executor::block_on;
use futures::future::{BoxFuture, Shared};
use futures::task::noop_waker_ref;
use futures::FutureExt;
use paint_eraser::erase::{commit, erase_canvas_drawable, erase_object};
use paint_eraser::{
    Canvas, Document, Element, ElementRef, ErasePath, EraseRequest, EraserError, EraserResult, ImmediateCloner, PathCloner,
    PathCommand, Shape, Transform,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn stroke(points: &[Pos2]) -> ErasePath {
    let mut commands = vec![PathCommand::MoveTo { to: points[0] }];
    commands.extend(points[1..].iter().map(|&to| PathCommand::LineTo { to }));
    ErasePath::from_commands(commands, 8.0)
}

fn assert_points_close(actual: &[Pos2], expected: &[Pos2]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((*a - *e).length() < 1e-3, "{:?} != {:?}", a, e);
    }
}

/// Holds every clone until the gate opens
struct GatedCloner {
    gate: Shared<oneshot::Receiver<()>>,
    started: Arc<AtomicUsize>,
}

impl PathCloner for GatedCloner {
    fn clone_path(&self, path: &ErasePath) -> BoxFuture<'static, EraserResult<ErasePath>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.clone();
        let path = path.clone();
        async move {
            let _ = gate.await;
            Ok(path)
        }
        .boxed()
    }
}

struct FailingCloner;

impl PathCloner for FailingCloner {
    fn clone_path(&self, _path: &ErasePath) -> BoxFuture<'static, EraserResult<ErasePath>> {
        futures::future::ready(Err(EraserError::CloneFailed("resource missing".to_string()))).boxed()
    }
}

#[test]
fn test_committed_path_maps_back_to_canvas_space() {
    init_logging();
    let shape = Shape::rect(vec2(60.0, 30.0))
        .transform(Transform::translate(vec2(80.0, 40.0)) * Transform::rotate(0.5) * Transform::scale(2.0, 1.5))
        .erasable(true)
        .build();
    let path = stroke(&[pos2(60.0, 30.0), pos2(80.0, 45.0), pos2(100.0, 40.0)]);

    let clone = block_on(erase_object(shape.as_ref(), &path, &ImmediateCloner)).unwrap();

    let matrix = shape.transform_matrix();
    assert!((matrix * clone.transform()).approx_eq(&path.transform(), 1e-3));
    let mapped: Vec<Pos2> = clone.placed_points().into_iter().map(|p| matrix.apply(p)).collect();
    assert_points_close(&mapped, &path.placed_points());

    // the committed clip child is the returned clone
    let clip = shape.clip().expect("clip installed");
    let group = clip.as_group().expect("clip is a group");
    assert_eq!(group.erase_paths().collect::<Vec<_>>(), vec![&clone]);
    // the original stroke is left alone
    assert!(path.transform().approx_eq(&Transform::translate(vec2(80.0, 37.5)), 1e-4));
}

#[test]
fn test_targets_are_cloned_concurrently() {
    init_logging();
    let document = Arc::new(Document::new(300, 100).unwrap());
    let targets: Vec<Arc<Shape>> = (0..4)
        .map(|i| {
            Shape::rect(vec2(20.0, 20.0))
                .centered_at(pos2(40.0 + 60.0 * i as f32, 50.0))
                .erasable(true)
                .build()
        })
        .collect();
    for target in &targets {
        document.add(Arc::clone(target));
    }

    let (open, gate) = oneshot::channel::<()>();
    let started = Arc::new(AtomicUsize::new(0));
    let cloner = GatedCloner {
        gate: gate.shared(),
        started: Arc::clone(&started),
    };
    let request = EraseRequest::new(
        stroke(&[pos2(20.0, 50.0), pos2(280.0, 50.0)]),
        targets.iter().map(|t| Arc::clone(t) as ElementRef).collect(),
    );

    let mut pending = commit(document as Arc<dyn Canvas>, Arc::new(cloner), request).boxed();
    let mut cx = Context::from_waker(noop_waker_ref());
    assert!(pending.poll_unpin(&mut cx).is_pending());

    // every clone is in flight before any of them finishes
    assert_eq!(started.load(Ordering::SeqCst), targets.len());
    assert!(targets.iter().all(|t| t.clip().is_none()));

    open.send(()).unwrap();
    let outcome = block_on(pending);
    assert!(outcome.is_complete());
    assert_eq!(outcome.erased.len(), targets.len());
    for target in &targets {
        assert!(outcome.path_for(target.id()).is_some());
        assert_eq!(target.clip().and_then(|c| c.as_group().map(|g| g.erase_paths().count())), Some(1));
    }
}

#[test]
fn test_failing_target_does_not_block_others() {
    init_logging();
    let document = Arc::new(Document::new(200, 200).unwrap());
    let healthy = Shape::rect(vec2(40.0, 40.0))
        .centered_at(pos2(50.0, 50.0))
        .erasable(true)
        .build();
    let collapsed = Shape::rect(vec2(40.0, 40.0))
        .transform(Transform::translate(vec2(100.0, 50.0)) * Transform::scale(0.0, 1.0))
        .erasable(true)
        .build();
    document.add(Arc::clone(&healthy));
    document.add(Arc::clone(&collapsed));

    let request = EraseRequest::new(
        stroke(&[pos2(30.0, 50.0), pos2(120.0, 50.0)]),
        vec![Arc::clone(&healthy) as ElementRef, Arc::clone(&collapsed) as ElementRef],
    );
    let outcome = block_on(commit(document as Arc<dyn Canvas>, Arc::new(ImmediateCloner), request));

    assert!(!outcome.is_complete());
    assert_eq!(outcome.erased.len(), 1);
    assert_eq!(outcome.erased[0].element.id(), healthy.id());
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].element.id(), collapsed.id());
    assert!(matches!(outcome.failed[0].error, EraserError::SingularTransform(id) if id == collapsed.id()));
    assert!(collapsed.clip().is_none());
    assert!(healthy.clip().is_some());
}

#[test]
fn test_clone_failure_is_reported() {
    init_logging();
    let shape = Shape::rect(vec2(10.0, 10.0)).erasable(true).build();
    let path = stroke(&[pos2(-5.0, 0.0), pos2(5.0, 0.0)]);

    let result = block_on(erase_object(shape.as_ref(), &path, &FailingCloner));
    assert!(matches!(result, Err(EraserError::CloneFailed(_))));
    assert!(shape.clip().is_none());
}

#[test]
fn test_screen_space_background_gets_viewport_correction() {
    init_logging();
    let document = Arc::new(Document::new(200, 200).unwrap());
    let viewport = Transform::translate(vec2(30.0, 10.0)) * Transform::scale(2.0, 2.0);
    document.set_viewport_transform(viewport);

    let background = Shape::rect(vec2(200.0, 200.0))
        .centered_at(pos2(100.0, 100.0))
        .erasable(true)
        .build();
    let overlay = Shape::rect(vec2(200.0, 200.0))
        .centered_at(pos2(100.0, 100.0))
        .erasable(true)
        .build();
    document.set_background(Arc::clone(&background), false);
    document.set_overlay(Arc::clone(&overlay), true);

    let path = stroke(&[pos2(20.0, 20.0), pos2(60.0, 40.0)]);
    let request = EraseRequest::new(path.clone(), Vec::new());
    let outcome = block_on(commit(document as Arc<dyn Canvas>, Arc::new(ImmediateCloner), request));

    assert!(outcome.is_complete());
    assert_eq!(outcome.erased.len(), 2);

    let on_background = outcome.path_for(background.id()).expect("background erased");
    let expected = viewport * path.transform();
    assert!((background.transform_matrix() * on_background.transform()).approx_eq(&expected, 1e-3));

    let on_overlay = outcome.path_for(overlay.id()).expect("overlay erased");
    assert!((overlay.transform_matrix() * on_overlay.transform()).approx_eq(&path.transform(), 1e-3));
}

#[test]
fn test_non_erasable_drawables_are_skipped() {
    init_logging();
    let document = Arc::new(Document::new(100, 100).unwrap());
    let background = Shape::rect(vec2(100.0, 100.0))
        .centered_at(pos2(50.0, 50.0))
        .build();
    document.set_background(Arc::clone(&background), true);

    let request = EraseRequest::new(stroke(&[pos2(10.0, 10.0), pos2(90.0, 90.0)]), Vec::new());
    let outcome = block_on(commit(document as Arc<dyn Canvas>, Arc::new(ImmediateCloner), request));

    assert!(outcome.erased.is_empty());
    assert!(outcome.is_complete());
    assert!(background.clip().is_none());
}

#[test]
fn test_drawable_without_viewport_correction_matches_object_erasing() {
    init_logging();
    let shape = Shape::rect(vec2(50.0, 50.0))
        .centered_at(pos2(25.0, 25.0))
        .erasable(true)
        .build();
    let path = stroke(&[pos2(0.0, 0.0), pos2(50.0, 50.0)]);

    let clone = block_on(erase_canvas_drawable(shape.as_ref(), None, &path, &ImmediateCloner)).unwrap();
    assert!(clone.transform().approx_eq(&Transform::IDENTITY, 1e-4));
}
