#![warn(clippy::all, rust_2018_idioms)]

pub mod canvas;
pub mod document;
pub mod element;
pub mod erase;
pub mod error;
pub mod event;
pub mod geometry;
pub mod path;
pub mod renderer;
pub mod stroke;
pub mod surface;
pub mod tool;

pub use canvas::{Canvas, CanvasDrawable, DrawableLayer, SnapshotPass};
pub use document::Document;
pub use element::{ClipGroup, ClipNode, Element, ElementId, ElementRef, Erasable, Shape};
pub use erase::{CommitOutcome, EraseRequest, ImmediateCloner, PathCloner};
pub use error::{EraserError, EraserResult};
pub use event::{ErasingEvent, ErasingPhase, EventBus, EventControl, RedrawKind};
pub use geometry::Transform;
pub use path::{CompositeOperation, ErasePath, PathCommand};
pub use renderer::{EffectOptions, EffectPainter, SnapshotPainter};
pub use stroke::{PencilCollector, StrokeCollector};
pub use surface::Surface;
pub use tool::{BrushConfig, EraserBrush, PointerContext, PointerUp, StrokeEnd};
