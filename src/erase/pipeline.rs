use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use log::{info, warn};

use super::{PathCloner, erase_canvas_drawable, erase_object};
use crate::canvas::{Canvas, DrawableLayer};
use crate::element::{Element, ElementId, ElementRef};
use crate::error::{EraserError, EraserResult};
use crate::path::ErasePath;

/// A finalized stroke and the elements it should erase
#[derive(Debug, Clone)]
pub struct EraseRequest {
    pub path: Arc<ErasePath>,
    pub targets: Vec<ElementRef>,
}

impl EraseRequest {
    pub fn new(path: ErasePath, targets: Vec<ElementRef>) -> Self {
        Self {
            path: Arc::new(path),
            targets,
        }
    }
}

#[derive(Debug)]
pub struct ErasedTarget {
    pub element: ElementRef,
    /// The committed clone, in the element's local space
    pub path: ErasePath,
}

#[derive(Debug)]
pub struct TargetFailure {
    pub element: ElementRef,
    pub error: EraserError,
}

/// Result of a commit. Each entry in `erased` is already applied; failures
/// don't roll anything back.
#[derive(Debug, Default)]
pub struct CommitOutcome {
    pub erased: Vec<ErasedTarget>,
    pub failed: Vec<TargetFailure>,
}

impl CommitOutcome {
    pub fn path_for(&self, id: ElementId) -> Option<&ErasePath> {
        self.erased
            .iter()
            .find(|target| target.element.id() == id)
            .map(|target| &target.path)
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

type TargetJob = BoxFuture<'static, (ElementRef, EraserResult<ErasePath>)>;

/// Erases every target, plus the canvas background and overlay when they are
/// erasable. All targets are processed concurrently.
pub async fn commit(canvas: Arc<dyn Canvas>, cloner: Arc<dyn PathCloner>, request: EraseRequest) -> CommitOutcome {
    let EraseRequest { path, targets } = request;

    let mut jobs: Vec<TargetJob> = targets
        .into_iter()
        .map(|element| {
            let path = Arc::clone(&path);
            let cloner = Arc::clone(&cloner);
            async move {
                let result = erase_object(element.as_ref(), &path, cloner.as_ref()).await;
                (element, result)
            }
            .boxed()
        })
        .collect();

    for layer in DrawableLayer::ALL {
        let Some(drawable) = canvas.drawable(layer) else {
            continue;
        };
        if !drawable.element.erasable().is_erasable() {
            continue;
        }
        let viewport = (!drawable.tracks_viewport).then(|| canvas.viewport_transform());
        let path = Arc::clone(&path);
        let cloner = Arc::clone(&cloner);
        let element = drawable.element;
        jobs.push(
            async move {
                let result = erase_canvas_drawable(element.as_ref(), viewport, &path, cloner.as_ref()).await;
                (element, result)
            }
            .boxed(),
        );
    }

    let mut outcome = CommitOutcome::default();
    for (element, result) in join_all(jobs).await {
        match result {
            Ok(path) => outcome.erased.push(ErasedTarget { element, path }),
            Err(error) => {
                warn!("Failed to erase element {}: {}", element.id(), error);
                outcome.failed.push(TargetFailure { element, error });
            }
        }
    }
    info!(
        "Committed erase stroke to {} element(s), {} failed",
        outcome.erased.len(),
        outcome.failed.len()
    );
    outcome
}
