use futures::FutureExt;
use futures::future::BoxFuture;
use log::debug;

use crate::element::{Element, commit_erasing};
use crate::error::{EraserError, EraserResult};
use crate::geometry::Transform;
use crate::path::ErasePath;

pub mod pipeline;

pub use pipeline::{CommitOutcome, EraseRequest, ErasedTarget, TargetFailure, commit};

/// Duplicates path geometry so every target owns an independent copy.
///
/// Cloning is the pipeline's only suspension point; hosts that load path
/// resources asynchronously plug in here.
pub trait PathCloner: Send + Sync {
    fn clone_path(&self, path: &ErasePath) -> BoxFuture<'static, EraserResult<ErasePath>>;
}

/// Clones in memory and resolves immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateCloner;

impl PathCloner for ImmediateCloner {
    fn clone_path(&self, path: &ErasePath) -> BoxFuture<'static, EraserResult<ErasePath>> {
        futures::future::ready(Ok(path.clone())).boxed()
    }
}

fn inverse_matrix(element: &dyn Element) -> EraserResult<Transform> {
    element
        .transform_matrix()
        .invert()
        .ok_or(EraserError::SingularTransform(element.id()))
}

/// Clones `path` (canvas space) into `element`'s local space and commits it
pub async fn erase_object(element: &dyn Element, path: &ErasePath, cloner: &dyn PathCloner) -> EraserResult<ErasePath> {
    let mut clone = cloner.clone_path(path).await?;
    let inverse = inverse_matrix(element)?;
    clone.set_transform(inverse * clone.transform());
    commit_erasing(element, clone.clone());
    debug!("Erased element {}", element.id());
    Ok(clone)
}

/// Like [`erase_object`] for background/overlay drawables.
///
/// `viewport` is given when the drawable is painted in screen space (it does
/// not follow the viewport), so the stroke must be carried through the
/// viewport transform first.
pub async fn erase_canvas_drawable(
    element: &dyn Element,
    viewport: Option<Transform>,
    path: &ErasePath,
    cloner: &dyn PathCloner,
) -> EraserResult<ErasePath> {
    let mut clone = cloner.clone_path(path).await?;
    let inverse = inverse_matrix(element)?;
    let correction = viewport.unwrap_or(Transform::IDENTITY);
    clone.set_transform(inverse * correction * clone.transform());
    commit_erasing(element, clone.clone());
    debug!(
        "Erased canvas drawable {} (viewport correction: {})",
        element.id(),
        viewport.is_some()
    );
    Ok(clone)
}
