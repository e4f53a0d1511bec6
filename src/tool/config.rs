use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::EraserResult;

/// User-facing eraser settings; may change between gestures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Only the alpha channel matters: it sets the erase intensity
    pub color: Color32,
    /// Stroke width in canvas units
    pub width: f32,
    /// Restore previously erased content instead of erasing
    pub inverted: bool,
    /// Minimum distance between kept points; `0` disables simplification
    pub decimate: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            width: 10.0,
            inverted: false,
            decimate: 0.4,
        }
    }
}

impl BrushConfig {
    pub fn opacity(&self) -> f32 {
        self.color.a() as f32 / 255.0
    }

    pub fn from_json(json: &str) -> EraserResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> EraserResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
