use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use egui::{Color32, Pos2, Rect, pos2};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

use crate::canvas::{Canvas, CanvasDrawable, DrawableLayer, SnapshotPass};
use crate::element::{Element, ElementRef, Erasable, Shape};
use crate::error::EraserResult;
use crate::geometry::Transform;
use crate::path::{CompositeOperation, ErasePath};
use crate::surface::Surface;

#[derive(Debug, Clone)]
struct Drawable {
    shape: Arc<Shape>,
    tracks_viewport: bool,
}

/// In-memory canvas holding [`Shape`]s
#[derive(Debug)]
pub struct Document {
    shapes: RwLock<Vec<Arc<Shape>>>,
    background: RwLock<Option<Drawable>>,
    overlay: RwLock<Option<Drawable>>,
    background_color: RwLock<Color32>,
    viewport: RwLock<Transform>,
    size: (u32, u32),
    retina_scaling: f32,
    top: Mutex<Surface>,
    render_requests: AtomicUsize,
}

impl Document {
    pub fn new(width: u32, height: u32) -> EraserResult<Self> {
        Self::with_retina_scaling(width, height, 1.0)
    }

    pub fn with_retina_scaling(width: u32, height: u32, retina_scaling: f32) -> EraserResult<Self> {
        let device_width = (width as f32 * retina_scaling).round() as u32;
        let device_height = (height as f32 * retina_scaling).round() as u32;
        Ok(Self {
            shapes: RwLock::new(Vec::new()),
            background: RwLock::new(None),
            overlay: RwLock::new(None),
            background_color: RwLock::new(Color32::TRANSPARENT),
            viewport: RwLock::new(Transform::IDENTITY),
            size: (width, height),
            retina_scaling,
            top: Mutex::new(Surface::new(device_width, device_height)?),
            render_requests: AtomicUsize::new(0),
        })
    }

    pub fn add(&self, shape: Arc<Shape>) {
        debug!("Adding shape {} to document", shape.id());
        self.shapes.write().push(shape);
    }

    pub fn shapes(&self) -> Vec<Arc<Shape>> {
        self.shapes.read().clone()
    }

    pub fn set_background(&self, shape: Arc<Shape>, tracks_viewport: bool) {
        *self.background.write() = Some(Drawable { shape, tracks_viewport });
    }

    pub fn set_overlay(&self, shape: Arc<Shape>, tracks_viewport: bool) {
        *self.overlay.write() = Some(Drawable { shape, tracks_viewport });
    }

    pub fn set_background_color(&self, color: Color32) {
        *self.background_color.write() = color;
    }

    pub fn set_viewport_transform(&self, transform: Transform) {
        *self.viewport.write() = transform;
    }

    pub fn render_requests(&self) -> usize {
        self.render_requests.load(Ordering::Acquire)
    }

    fn layer(&self, layer: DrawableLayer) -> Option<Drawable> {
        match layer {
            DrawableLayer::Background => self.background.read().clone(),
            DrawableLayer::Overlay => self.overlay.read().clone(),
        }
    }

    fn paint_drawable(&self, drawable: &Drawable, pass: SnapshotPass, target: &mut Surface) {
        let device = Transform::scale(self.retina_scaling, self.retina_scaling);
        let screen = if drawable.tracks_viewport {
            device * self.viewport_transform()
        } else {
            device
        };
        paint_shape(&drawable.shape, pass, &screen, target);
    }
}

/// Paints `shape` with its committed erasures applied, except in the
/// `Restored` pass which ignores them
fn paint_shape(shape: &Shape, pass: SnapshotPass, screen: &Transform, target: &mut Surface) {
    if pass == SnapshotPass::Retained {
        match shape.erasable() {
            // nothing below a non-erasable shape can be erased
            Erasable::No => return paint_shape(shape, SnapshotPass::Full, screen, target),
            Erasable::Yes => return,
            Erasable::Deep if !shape.is_container() => return,
            Erasable::Deep => {}
        }
    }

    let erasures = match pass {
        SnapshotPass::Restored => Vec::new(),
        SnapshotPass::Full | SnapshotPass::Retained => committed_erasures(shape),
    };
    if erasures.is_empty() {
        paint_content(shape, pass, screen, target);
        return;
    }

    let (width, height) = (target.width(), target.height());
    let (mut layer, mut mask) = match (Surface::new(width, height), Surface::new(width, height)) {
        (Ok(layer), Ok(mask)) => (layer, mask),
        (Err(err), _) | (_, Err(err)) => {
            warn!("Painting shape {} without its erasures: {}", shape.id(), err);
            paint_content(shape, pass, screen, target);
            return;
        }
    };
    paint_content(shape, pass, screen, &mut layer);

    let full = Rect::from_min_max(Pos2::ZERO, pos2(width as f32, height as f32));
    mask.fill_rect(full, Color32::BLACK);
    let placement = *screen * shape.transform_matrix();
    for path in &erasures {
        apply_erasure(&mut mask, &placement, path);
    }
    mask.composite(&layer, CompositeOperation::SourceIn, 1.0);
    target.composite(&mask, CompositeOperation::SourceOver, 1.0);
}

/// Fills the bounds of every leaf that belongs in `pass`
fn paint_content(shape: &Shape, pass: SnapshotPass, screen: &Transform, target: &mut Surface) {
    if shape.is_container() {
        for child in shape.shapes() {
            paint_shape(child, pass, screen, target);
        }
        return;
    }
    let rect = screen.apply_rect(shape.bounding_rect());
    target.fill_rect(rect, shape.fill());
}

fn committed_erasures(shape: &Shape) -> Vec<ErasePath> {
    shape
        .clip()
        .and_then(|clip| clip.as_group().map(|group| group.erase_paths().cloned().collect()))
        .unwrap_or_default()
}

/// Strokes one committed path onto the clip mask. Erasing paths cut the mask,
/// restoring ones paint it back.
fn apply_erasure(mask: &mut Surface, placement: &Transform, path: &ErasePath) {
    let Ok(mut stroke) = Surface::new(mask.width(), mask.height()) else {
        return;
    };
    let points: Vec<Pos2> = path.placed_points().into_iter().map(|p| placement.apply(p)).collect();
    let width = path.stroke_width() * (*placement * path.transform()).scaling().max_elem();
    stroke.stroke_polyline(&points, width, path.stroke());
    mask.composite(&stroke, path.composite(), path.opacity());
}

impl Canvas for Document {
    fn elements(&self) -> Vec<ElementRef> {
        self.shapes
            .read()
            .iter()
            .map(|shape| Arc::clone(shape) as ElementRef)
            .collect()
    }

    fn drawable(&self, layer: DrawableLayer) -> Option<CanvasDrawable> {
        self.layer(layer).map(|drawable| CanvasDrawable {
            element: drawable.shape as ElementRef,
            tracks_viewport: drawable.tracks_viewport,
        })
    }

    fn viewport_transform(&self) -> Transform {
        *self.viewport.read()
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn retina_scaling(&self) -> f32 {
        self.retina_scaling
    }

    fn top_context(&self) -> &Mutex<Surface> {
        &self.top
    }

    fn render_snapshot(&self, pass: SnapshotPass, target: &mut Surface) {
        target.clear();

        let background_color = *self.background_color.read();
        if background_color != Color32::TRANSPARENT {
            let (width, height) = (target.width() as f32, target.height() as f32);
            target.fill_rect(
                Rect::from_min_max(Pos2::ZERO, pos2(width, height)),
                background_color,
            );
        }

        if let Some(background) = self.layer(DrawableLayer::Background) {
            self.paint_drawable(&background, pass, target);
        }

        let device = Transform::scale(self.retina_scaling, self.retina_scaling);
        let screen = device * self.viewport_transform();
        for shape in self.shapes.read().iter() {
            paint_shape(shape, pass, &screen, target);
        }

        if let Some(overlay) = self.layer(DrawableLayer::Overlay) {
            self.paint_drawable(&overlay, pass, target);
        }
    }

    fn request_render_all(&self) {
        self.render_requests.fetch_add(1, Ordering::AcqRel);
    }
}
