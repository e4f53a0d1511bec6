use std::fmt;
use std::sync::Arc;

use egui::{Pos2, Rect, Vec2};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Transform;
use crate::path::ErasePath;

pub mod clip;
mod shape;

pub use clip::{ClipChild, ClipGeometry, ClipGroup, ClipNode, ClipShape, Origin, assert_clipping_group, commit_erasing};
pub use shape::{Shape, ShapeBuilder};

/// Stable identity of a canvas element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether an element takes part in erasing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Erasable {
    #[default]
    No,
    Yes,
    /// Containers with this flag are skipped by selection; their children are
    /// considered individually instead.
    Deep,
}

impl Erasable {
    pub fn is_erasable(self) -> bool {
        !matches!(self, Self::No)
    }
}

impl From<bool> for Erasable {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

/// Capability surface the eraser needs from a host canvas object.
///
/// Objects are shared (`Arc`) and mutated through interior mutability: the
/// clip slot is the only state the eraser writes, and it lives behind a mutex.
pub trait Element: Send + Sync + fmt::Debug {
    fn id(&self) -> ElementId;

    fn erasable(&self) -> Erasable;

    fn is_container(&self) -> bool {
        false
    }

    /// Direct children of a container, in paint order
    fn children(&self) -> Vec<ElementRef> {
        Vec::new()
    }

    /// Full object-to-canvas matrix, including any parent group transform.
    /// Object-local space is centered on the object.
    fn transform_matrix(&self) -> Transform;

    /// Untransformed width and height
    fn size(&self) -> Vec2;

    fn stroke_width(&self) -> f32 {
        0.0
    }

    /// A uniform stroke keeps its width regardless of object scaling
    fn stroke_uniform(&self) -> bool {
        false
    }

    fn scaling(&self) -> Vec2 {
        self.transform_matrix().scaling()
    }

    /// Axis-aligned bounds in canvas space
    fn bounding_rect(&self) -> Rect {
        let local = Rect::from_center_size(Pos2::ZERO, self.size());
        self.transform_matrix().apply_rect(local)
    }

    fn intersects_path(&self, path: &ErasePath) -> bool {
        self.bounding_rect().intersects(path.bounding_rect())
    }

    fn clip_slot(&self) -> &Mutex<Option<ClipNode>>;

    /// Forces the object to re-render (and drop any cached raster)
    fn mark_dirty(&self);
}

pub type ElementRef = Arc<dyn Element>;
