use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use egui::{Color32, Pos2, Vec2};
use parking_lot::{Mutex, RwLock};

use super::{ClipNode, Element, ElementId, ElementRef, Erasable};
use crate::geometry::Transform;

#[derive(Debug)]
enum ShapeKind {
    Rect,
    Group(Vec<Arc<Shape>>),
}

/// Reference scene object: a filled rectangle or a group of shapes.
///
/// Used by [`crate::Document`]; hosts with their own object model implement
/// [`Element`] directly.
#[derive(Debug)]
pub struct Shape {
    id: ElementId,
    kind: ShapeKind,
    size: Vec2,
    fill: Color32,
    erasable: Erasable,
    stroke_width: f32,
    stroke_uniform: bool,
    /// Own placement, relative to the parent group (or the canvas)
    transform: RwLock<Transform>,
    /// Accumulated transform of enclosing groups
    parent_transform: RwLock<Transform>,
    clip: Mutex<Option<ClipNode>>,
    dirty: AtomicBool,
}

/// Builder for [`Shape`]
#[derive(Debug)]
pub struct ShapeBuilder {
    kind: ShapeKind,
    size: Vec2,
    fill: Color32,
    erasable: Erasable,
    stroke_width: f32,
    stroke_uniform: bool,
    transform: Transform,
    clip: Option<ClipNode>,
}

impl ShapeBuilder {
    fn new(kind: ShapeKind, size: Vec2) -> Self {
        Self {
            kind,
            size,
            fill: Color32::GRAY,
            erasable: Erasable::No,
            stroke_width: 0.0,
            stroke_uniform: false,
            transform: Transform::IDENTITY,
            clip: None,
        }
    }

    /// Places the shape's center at `center`, keeping any scale/rotation set so far
    pub fn centered_at(mut self, center: Pos2) -> Self {
        self.transform.e = center.x;
        self.transform.f = center.y;
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn erasable(mut self, erasable: impl Into<Erasable>) -> Self {
        self.erasable = erasable.into();
        self
    }

    pub fn fill(mut self, fill: Color32) -> Self {
        self.fill = fill;
        self
    }

    pub fn stroke(mut self, width: f32, uniform: bool) -> Self {
        self.stroke_width = width;
        self.stroke_uniform = uniform;
        self
    }

    pub fn clip(mut self, clip: ClipNode) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn build(self) -> Arc<Shape> {
        let shape = Arc::new(Shape {
            id: ElementId::new(),
            kind: self.kind,
            size: self.size,
            fill: self.fill,
            erasable: self.erasable,
            stroke_width: self.stroke_width,
            stroke_uniform: self.stroke_uniform,
            transform: RwLock::new(self.transform),
            parent_transform: RwLock::new(Transform::IDENTITY),
            clip: Mutex::new(self.clip),
            dirty: AtomicBool::new(true),
        });
        shape.propagate_transform();
        shape
    }
}

impl Shape {
    pub fn rect(size: Vec2) -> ShapeBuilder {
        ShapeBuilder::new(ShapeKind::Rect, size)
    }

    /// A group of `size`, centered on its own origin, owning `children`.
    /// Children keep their transforms, now read relative to the group.
    pub fn group(size: Vec2, children: Vec<Arc<Shape>>) -> ShapeBuilder {
        ShapeBuilder::new(ShapeKind::Group(children), size)
    }

    pub fn fill(&self) -> Color32 {
        self.fill
    }

    pub fn shapes(&self) -> &[Arc<Shape>] {
        match &self.kind {
            ShapeKind::Group(children) => children,
            ShapeKind::Rect => &[],
        }
    }

    pub fn set_transform(&self, transform: Transform) {
        *self.transform.write() = transform;
        self.propagate_transform();
        self.mark_dirty();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Called by the renderer once the shape has been drawn
    pub fn mark_clean(&self) {
        self.dirty.store(false, Ordering::Release);
        if let Some(ClipNode::Group(group)) = self.clip.lock().as_mut() {
            group.mark_clean();
        }
    }

    pub fn clip(&self) -> Option<ClipNode> {
        self.clip.lock().clone()
    }

    fn propagate_transform(&self) {
        let matrix = self.transform_matrix();
        for child in self.shapes() {
            *child.parent_transform.write() = matrix;
            child.propagate_transform();
        }
    }
}

impl Element for Shape {
    fn id(&self) -> ElementId {
        self.id
    }

    fn erasable(&self) -> Erasable {
        self.erasable
    }

    fn is_container(&self) -> bool {
        matches!(self.kind, ShapeKind::Group(_))
    }

    fn children(&self) -> Vec<ElementRef> {
        self.shapes()
            .iter()
            .map(|child| Arc::clone(child) as ElementRef)
            .collect()
    }

    fn transform_matrix(&self) -> Transform {
        *self.parent_transform.read() * *self.transform.read()
    }

    fn size(&self) -> Vec2 {
        self.size
    }

    fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    fn stroke_uniform(&self) -> bool {
        self.stroke_uniform
    }

    fn clip_slot(&self) -> &Mutex<Option<ClipNode>> {
        &self.clip
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}
