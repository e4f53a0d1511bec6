mod config;
mod eraser;
mod trait_def;

pub use config::BrushConfig;
pub use eraser::{EraserBrush, EraserBrushBuilder};
pub use trait_def::{PointerContext, PointerUp, StrokeEnd};
