use parking_lot::Mutex;

use crate::element::ElementRef;
use crate::geometry::Transform;
use crate::surface::Surface;

/// Canvas-level drawables painted outside the object list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawableLayer {
    Background,
    Overlay,
}

impl DrawableLayer {
    pub const ALL: [Self; 2] = [Self::Background, Self::Overlay];
}

#[derive(Debug, Clone)]
pub struct CanvasDrawable {
    pub element: ElementRef,
    /// Whether the drawable already follows the viewport transform
    pub tracks_viewport: bool,
}

/// Which content a snapshot should contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotPass {
    /// Everything, as currently rendered
    Full,
    /// Only content that erasing can't remove
    Retained,
    /// Everything, with committed erasures ignored
    Restored,
}

/// Capability surface the eraser needs from the host canvas
pub trait Canvas: Send + Sync {
    /// Top-level elements in paint order
    fn elements(&self) -> Vec<ElementRef>;

    fn drawable(&self, layer: DrawableLayer) -> Option<CanvasDrawable>;

    fn viewport_transform(&self) -> Transform;

    /// Size in CSS pixels
    fn size(&self) -> (u32, u32);

    /// Device pixels per CSS pixel
    fn retina_scaling(&self) -> f32 {
        1.0
    }

    /// Device-pixel size of raster buffers matching this canvas
    fn device_size(&self) -> (u32, u32) {
        let (width, height) = self.size();
        let scale = self.retina_scaling();
        (
            (width as f32 * scale).round() as u32,
            (height as f32 * scale).round() as u32,
        )
    }

    /// Transient drawing context layered above the rendered content
    fn top_context(&self) -> &Mutex<Surface>;

    fn clear_top_context(&self) {
        self.top_context().lock().clear();
    }

    /// Renders the requested content into `target` in device pixels
    fn render_snapshot(&self, pass: SnapshotPass, target: &mut Surface);

    fn request_render_all(&self);
}
