use egui::Pos2;
use futures::future::BoxFuture;

use crate::erase::{CommitOutcome, EraseRequest};

/// A normalized pointer event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerContext {
    /// Position in canvas (scene) coordinates
    pub point: Pos2,
    /// Main button of the primary pointer; other pointers are ignored on press
    pub primary: bool,
}

impl PointerContext {
    pub fn primary(point: Pos2) -> Self {
        Self { point, primary: true }
    }

    pub fn secondary(point: Pos2) -> Self {
        Self { point, primary: false }
    }
}

/// How a stroke ended
#[must_use = "a `Committing` stroke only takes effect once its future is driven"]
pub enum StrokeEnd {
    /// The brush was not drawing
    Inactive,
    /// Fewer than two points were collected
    Cancelled,
    /// A handler prevented `end`; the request can be committed manually
    Prevented(EraseRequest),
    /// Commit in flight. Resolves after the top context is cleared and a
    /// re-render is requested, so it must be driven to completion.
    Committing(BoxFuture<'static, CommitOutcome>),
}

impl std::fmt::Debug for StrokeEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "Inactive"),
            Self::Cancelled => write!(f, "Cancelled"),
            Self::Prevented(request) => f.debug_tuple("Prevented").field(request).finish(),
            Self::Committing(_) => write!(f, "Committing(<future>)"),
        }
    }
}

/// Returned from pointer-up
#[derive(Debug)]
#[must_use = "carries the stroke's commit future"]
pub struct PointerUp {
    /// Always `false`: the host resumes its normal event dispatch right away
    pub capture: bool,
    pub end: StrokeEnd,
}
