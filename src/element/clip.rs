use egui::{Pos2, Vec2, vec2};
use log::debug;
use parking_lot::{MappedMutexGuard, MutexGuard};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Element;
use crate::path::{ErasePath, PathCommand};

/// Which point of a clip shape `position` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Origin {
    #[default]
    Center,
    TopLeft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClipGeometry {
    Rect { size: Vec2 },
    Circle { radius: f32 },
    /// Closed outline, commands relative to the shape center
    Path { commands: Vec<PathCommand>, size: Vec2 },
}

impl ClipGeometry {
    pub fn size(&self) -> Vec2 {
        match self {
            Self::Rect { size } | Self::Path { size, .. } => *size,
            Self::Circle { radius } => vec2(radius * 2.0, radius * 2.0),
        }
    }
}

/// A plain (non-group) clip, positioned in its owner's local space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipShape {
    pub geometry: ClipGeometry,
    pub position: Pos2,
    pub origin: Origin,
}

impl ClipShape {
    pub fn new(geometry: ClipGeometry, position: Pos2, origin: Origin) -> Self {
        Self {
            geometry,
            position,
            origin,
        }
    }

    pub fn center_point(&self) -> Pos2 {
        match self.origin {
            Origin::Center => self.position,
            Origin::TopLeft => self.position + self.geometry.size() / 2.0,
        }
    }

    /// Re-anchors the shape on its center without moving it; returns the
    /// translation applied to `position`.
    pub fn normalize_origin(&mut self) -> Vec2 {
        let center = self.center_point();
        let translation = center - self.position;
        self.position = center;
        self.origin = Origin::Center;
        translation
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClipChild {
    /// A clip the owner had before its first erasure
    Base(ClipShape),
    Erase(ErasePath),
}

/// Persistent clip container that accumulates erase strokes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipGroup {
    id: Uuid,
    size: Vec2,
    children: Vec<ClipChild>,
    #[serde(skip)]
    dirty: bool,
}

impl ClipGroup {
    pub fn new(size: Vec2) -> Self {
        Self {
            id: Uuid::new_v4(),
            size,
            children: Vec::new(),
            dirty: true,
        }
    }

    /// Wraps a pre-existing clip as the group's base child
    fn wrapping(size: Vec2, existing: Option<ClipShape>) -> Self {
        let mut group = Self::new(size);
        if let Some(mut shape) = existing {
            let translation = shape.normalize_origin();
            debug!("Wrapping existing clip, origin moved by {:?}", translation);
            group.children.push(ClipChild::Base(shape));
        }
        group
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn children(&self) -> &[ClipChild] {
        &self.children
    }

    pub fn base(&self) -> Option<&ClipShape> {
        self.children.iter().find_map(|child| match child {
            ClipChild::Base(shape) => Some(shape),
            ClipChild::Erase(_) => None,
        })
    }

    /// Committed erase strokes, oldest first
    pub fn erase_paths(&self) -> impl Iterator<Item = &ErasePath> {
        self.children.iter().filter_map(|child| match child {
            ClipChild::Erase(path) => Some(path),
            ClipChild::Base(_) => None,
        })
    }

    pub fn push_erase(&mut self, path: ErasePath) {
        self.children.push(ClipChild::Erase(path));
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// The single top-level clip an element may own
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClipNode {
    Group(ClipGroup),
    Shape(ClipShape),
}

impl ClipNode {
    pub fn as_group(&self) -> Option<&ClipGroup> {
        match self {
            Self::Group(group) => Some(group),
            Self::Shape(_) => None,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Size of the clip group for `element`: its own size plus the stroke, with a
/// uniform stroke measured in screen units.
fn clip_group_size(element: &dyn Element) -> Vec2 {
    let width = element.stroke_width();
    let stroke = if element.stroke_uniform() {
        let scaling = element.scaling();
        vec2(
            if scaling.x > 0.0 { width / scaling.x } else { width },
            if scaling.y > 0.0 { width / scaling.y } else { width },
        )
    } else {
        vec2(width, width)
    };
    element.size() + stroke
}

/// Returns the element's clip group, installing one first if needed.
///
/// Calling this repeatedly hands back the same group. A plain clip already on
/// the element becomes the base child of the new group.
pub fn assert_clipping_group(element: &dyn Element) -> MappedMutexGuard<'_, ClipGroup> {
    let size = clip_group_size(element);
    let id = element.id();
    MutexGuard::map(element.clip_slot().lock(), move |slot| {
        if !matches!(slot, Some(ClipNode::Group(_))) {
            let existing = match slot.take() {
                Some(ClipNode::Shape(shape)) => Some(shape),
                _ => None,
            };
            debug!("Installing clip group on element {}", id);
            *slot = Some(ClipNode::Group(ClipGroup::wrapping(size, existing)));
        }
        match slot {
            Some(ClipNode::Group(group)) => group,
            _ => unreachable!("clip slot holds a group after installation"),
        }
    })
}

/// Appends `path` (already in the element's local space) to its clip group
pub fn commit_erasing(element: &dyn Element, path: ErasePath) {
    {
        let mut group = assert_clipping_group(element);
        group.push_erase(path);
    }
    element.mark_dirty();
}
