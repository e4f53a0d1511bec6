use egui::{pos2, vec2};
use paint_eraser::element::{ClipChild, ClipGeometry, ClipShape, Origin, assert_clipping_group, commit_erasing};
use paint_eraser::{ClipNode, ErasePath, PathCommand, Shape, Transform};

fn stroke_path(y: f32) -> ErasePath {
    ErasePath::from_commands(
        vec![
            PathCommand::MoveTo { to: pos2(-10.0, y) },
            PathCommand::LineTo { to: pos2(10.0, y) },
        ],
        4.0,
    )
}

#[test]
fn test_assert_clipping_group_is_idempotent() {
    let shape = Shape::rect(vec2(40.0, 20.0)).erasable(true).build();
    assert!(shape.clip().is_none());

    let first = assert_clipping_group(shape.as_ref()).id();
    let second = assert_clipping_group(shape.as_ref()).id();
    assert_eq!(first, second);

    let clip = shape.clip().expect("group installed");
    let group = clip.as_group().expect("clip is a group");
    assert!(group.children().is_empty());
    assert_eq!(group.size(), vec2(40.0, 20.0));
}

#[test]
fn test_existing_clip_is_wrapped_around_its_center() {
    let existing = ClipShape::new(
        ClipGeometry::Rect { size: vec2(20.0, 10.0) },
        pos2(-10.0, -5.0),
        Origin::TopLeft,
    );
    let shape = Shape::rect(vec2(40.0, 20.0))
        .erasable(true)
        .clip(ClipNode::Shape(existing.clone()))
        .build();

    let group_id = assert_clipping_group(shape.as_ref()).id();

    let clip = shape.clip().expect("group installed");
    let group = clip.as_group().expect("clip is a group");
    assert_eq!(group.id(), group_id);
    assert_eq!(group.children().len(), 1);

    let base = group.base().expect("existing clip kept as base");
    assert_eq!(base.origin, Origin::Center);
    assert_eq!(base.position, existing.center_point());
    assert_eq!(base.center_point(), pos2(0.0, 0.0));
    assert_eq!(base.geometry, existing.geometry);
}

#[test]
fn test_commits_accumulate_in_order() {
    let shape = Shape::rect(vec2(40.0, 40.0)).erasable(true).build();
    let first = stroke_path(-5.0);
    let second = stroke_path(5.0).with_style(
        egui::Color32::BLACK,
        0.5,
        paint_eraser::CompositeOperation::DestinationOut,
    );

    shape.mark_clean();
    commit_erasing(shape.as_ref(), first.clone());
    assert!(shape.is_dirty());

    let group_id = shape.clip().and_then(|clip| clip.as_group().map(|group| group.id()));
    commit_erasing(shape.as_ref(), second.clone());

    let clip = shape.clip().expect("group installed");
    let group = clip.as_group().expect("clip is a group");
    assert_eq!(Some(group.id()), group_id);
    let paths: Vec<&ErasePath> = group.erase_paths().collect();
    assert_eq!(paths, vec![&first, &second]);
    assert!(group.is_dirty());

    shape.mark_clean();
    let clip = shape.clip().expect("group installed");
    assert!(!clip.as_group().expect("clip is a group").is_dirty());
}

#[test]
fn test_clip_group_size_includes_stroke() {
    let plain = Shape::rect(vec2(40.0, 20.0))
        .stroke(4.0, false)
        .transform(Transform::scale(2.0, 2.0))
        .build();
    assert_eq!(assert_clipping_group(plain.as_ref()).size(), vec2(44.0, 24.0));

    let uniform = Shape::rect(vec2(40.0, 20.0))
        .stroke(4.0, true)
        .transform(Transform::scale(2.0, 4.0))
        .build();
    assert_eq!(assert_clipping_group(uniform.as_ref()).size(), vec2(42.0, 21.0));
}

#[test]
fn test_clip_group_survives_json() {
    let shape = Shape::rect(vec2(30.0, 30.0))
        .erasable(true)
        .clip(ClipNode::Shape(ClipShape::new(
            ClipGeometry::Circle { radius: 10.0 },
            pos2(0.0, 0.0),
            Origin::Center,
        )))
        .build();
    commit_erasing(shape.as_ref(), stroke_path(0.0));
    commit_erasing(shape.as_ref(), stroke_path(8.0));

    let clip = shape.clip().expect("group installed");
    let json = clip.to_json().expect("serialize clip");
    let restored = ClipNode::from_json(&json).expect("deserialize clip");

    let original = clip.as_group().expect("clip is a group");
    let restored = restored.as_group().expect("restored clip is a group");
    assert_eq!(restored.id(), original.id());
    assert_eq!(restored.size(), original.size());
    assert_eq!(restored.children(), original.children());
    assert!(matches!(restored.children()[0], ClipChild::Base(_)));
    assert_eq!(restored.erase_paths().count(), 2);
}
