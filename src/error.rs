use thiserror::Error;

use crate::element::ElementId;

/// Errors raised by the eraser brush and its commit pipeline
#[derive(Debug, Error)]
pub enum EraserError {
    /// The off-screen effect buffer (or another raster surface) could not be allocated
    #[error(
        "cannot create a {width}x{height} rendering context for the eraser effect buffer; \
         make sure the canvas has a non-zero size before creating the brush"
    )]
    ContextUnavailable { width: u32, height: u32 },

    /// The target's transform cannot be inverted, so the stroke can't be mapped into it
    #[error("element {0} has a non-invertible transform")]
    SingularTransform(ElementId),

    #[error("failed to clone erase path: {0}")]
    CloneFailed(String),

    #[error("invalid brush configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type EraserResult<T> = Result<T, EraserError>;
