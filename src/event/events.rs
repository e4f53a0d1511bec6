use crate::erase::EraseRequest;
use crate::tool::PointerContext;

/// Lifecycle phase of an erasing gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErasingPhase {
    Start,
    Move,
    End,
    Redraw,
    Cancel,
}

impl ErasingPhase {
    /// Only `Cancel` ignores `prevent_default`
    pub fn is_cancelable(self) -> bool {
        !matches!(self, Self::Cancel)
    }
}

/// Why the effect buffer is about to be redrawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawKind {
    /// A stroke is starting
    Start,
    /// The host finished a full canvas render
    Render,
}

#[derive(Debug, Clone, Copy)]
pub enum ErasingEvent<'a> {
    /// Pointer went down; preventing keeps the brush idle
    Start(&'a PointerContext),
    /// Pointer moved during a stroke; preventing drops the point
    Move(&'a PointerContext),
    /// Stroke finalized; preventing skips the commit
    End(&'a EraseRequest),
    /// Effect buffer is about to be redrawn; preventing skips the redraw
    Redraw(RedrawKind),
    /// Stroke ended with fewer than two points
    Cancel,
}

impl ErasingEvent<'_> {
    pub fn phase(&self) -> ErasingPhase {
        match self {
            Self::Start(_) => ErasingPhase::Start,
            Self::Move(_) => ErasingPhase::Move,
            Self::End(_) => ErasingPhase::End,
            Self::Redraw(_) => ErasingPhase::Redraw,
            Self::Cancel => ErasingPhase::Cancel,
        }
    }
}

/// Per-dispatch control handed to every handler
#[derive(Debug)]
pub struct EventControl {
    cancelable: bool,
    default_prevented: bool,
}

impl EventControl {
    pub(crate) fn new(cancelable: bool) -> Self {
        Self {
            cancelable,
            default_prevented: false,
        }
    }

    /// Skips the brush's default action for this event. No effect on `cancel`.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
