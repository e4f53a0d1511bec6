use std::sync::Arc;

use egui::{Color32, Pos2};
use futures::FutureExt;
use futures::future::BoxFuture;
use log::{debug, info, warn};

use super::{BrushConfig, PointerContext, PointerUp, StrokeEnd};
use crate::canvas::Canvas;
use crate::erase::{self, CommitOutcome, EraseRequest, ImmediateCloner, PathCloner};
use crate::error::EraserResult;
use crate::event::{ErasingEvent, ErasingPhase, EventBus, EventControl, RedrawKind, SubscriptionId};
use crate::geometry::{Transform, walk};
use crate::path::{CompositeOperation, ErasePath};
use crate::renderer::{EffectBuffer, EffectOptions, EffectPainter, SnapshotPainter};
use crate::stroke::{PencilCollector, StrokeCollector};
use crate::surface::Surface;

/// Builder for [`EraserBrush`]; every collaborator has a default
pub struct EraserBrushBuilder {
    canvas: Arc<dyn Canvas>,
    collector: Box<dyn StrokeCollector>,
    painter: Box<dyn EffectPainter>,
    cloner: Arc<dyn PathCloner>,
    config: BrushConfig,
}

impl EraserBrushBuilder {
    pub fn collector(mut self, collector: impl StrokeCollector + 'static) -> Self {
        self.collector = Box::new(collector);
        self
    }

    pub fn painter(mut self, painter: impl EffectPainter + 'static) -> Self {
        self.painter = Box::new(painter);
        self
    }

    pub fn cloner(mut self, cloner: impl PathCloner + 'static) -> Self {
        self.cloner = Arc::new(cloner);
        self
    }

    pub fn config(mut self, config: BrushConfig) -> Self {
        self.config = config;
        self
    }

    /// Fails when the off-screen effect buffer can't be allocated
    pub fn build(self) -> EraserResult<EraserBrush> {
        let effect = EffectBuffer::for_canvas(self.canvas.as_ref())?;
        Ok(EraserBrush {
            canvas: self.canvas,
            collector: self.collector,
            painter: self.painter,
            cloner: self.cloner,
            events: EventBus::new(),
            effect,
            config: self.config,
            active: false,
        })
    }
}

/// Selective eraser: turns pointer gestures into clip-mask erasures on the
/// erasable elements of a canvas.
///
/// Every phase fires an event first (see [`ErasingEvent`]); handlers can
/// prevent the default action of all phases but `cancel`.
pub struct EraserBrush {
    canvas: Arc<dyn Canvas>,
    collector: Box<dyn StrokeCollector>,
    painter: Box<dyn EffectPainter>,
    cloner: Arc<dyn PathCloner>,
    events: EventBus,
    effect: EffectBuffer,
    config: BrushConfig,
    active: bool,
}

impl std::fmt::Debug for EraserBrush {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EraserBrush")
            .field("config", &self.config)
            .field("active", &self.active)
            .field("effect", &self.effect)
            .field("events", &self.events)
            .finish()
    }
}

impl EraserBrush {
    pub fn new(canvas: Arc<dyn Canvas>) -> EraserResult<Self> {
        Self::builder(canvas).build()
    }

    pub fn builder(canvas: Arc<dyn Canvas>) -> EraserBrushBuilder {
        EraserBrushBuilder {
            canvas,
            collector: Box::new(PencilCollector::new()),
            painter: Box::new(SnapshotPainter),
            cloner: Arc::new(ImmediateCloner),
            config: BrushConfig::default(),
        }
    }

    pub fn config(&self) -> &BrushConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BrushConfig {
        &mut self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Subscribe to one erasing phase
    pub fn on<F>(&self, phase: ErasingPhase, handler: F) -> SubscriptionId
    where
        F: FnMut(&ErasingEvent<'_>, &mut EventControl) + 'static,
    {
        self.events.subscribe(phase, handler)
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Current effect buffer contents, `None` after [`EraserBrush::dispose`]
    pub fn effect(&self) -> Option<&Surface> {
        self.effect.surface()
    }

    pub fn on_pointer_down(&mut self, pointer: &PointerContext) {
        if !pointer.primary {
            return;
        }
        if self.events.emit(&ErasingEvent::Start(pointer)).default_prevented() {
            debug!("Erasing start prevented");
            return;
        }
        self.active = true;
        self.redraw_effect(RedrawKind::Start);
        self.collector.begin(pointer.point);
        self.render_preview();
    }

    pub fn on_pointer_move(&mut self, pointer: &PointerContext) {
        if !self.active {
            return;
        }
        if self.events.emit(&ErasingEvent::Move(pointer)).default_prevented() {
            return;
        }
        if self.collector.collect_point(pointer.point) {
            self.render_preview();
        }
    }

    pub fn on_pointer_up(&mut self, _pointer: &PointerContext) -> PointerUp {
        let end = if self.active {
            let points = self.collector.finalize_points();
            let end = self.finalize(points);
            self.active = false;
            end
        } else {
            StrokeEnd::Inactive
        };
        PointerUp { capture: false, end }
    }

    /// Fires `redraw` and, unless prevented, repaints the effect buffer.
    /// Hosts may call this with [`RedrawKind::Render`] after a full render.
    pub fn redraw_effect(&mut self, kind: RedrawKind) -> bool {
        if self.events.emit(&ErasingEvent::Redraw(kind)).default_prevented() {
            debug!("Effect redraw ({:?}) prevented", kind);
            return false;
        }
        self.draw_effect();
        true
    }

    pub fn draw_effect(&mut self) {
        let options = EffectOptions {
            opacity: self.config.opacity(),
            inverted: self.config.inverted,
        };
        if let Err(err) = self.effect.draw(self.painter.as_ref(), options, self.canvas.as_ref()) {
            warn!("Failed to draw erasing effect: {}", err);
        }
    }

    /// Paints the in-progress stroke on the top context, showing the effect
    /// only underneath the stroke
    pub fn render_preview(&self) {
        let points = self.collector.points();
        if points.is_empty() {
            return;
        }
        let viewport = self.canvas.viewport_transform();
        let scale = self.canvas.retina_scaling();
        let screen = Transform::scale(scale, scale) * viewport;
        let screen_points: Vec<Pos2> = points.iter().map(|p| screen.apply(*p)).collect();
        let width = self.config.width * viewport.zoom() * scale;

        let mut top = self.canvas.top_context().lock();
        top.clear();
        top.stroke_polyline(&screen_points, width, Color32::BLACK);
        if let Some(effect) = self.effect.surface() {
            top.composite(effect, CompositeOperation::SourceIn, 1.0);
        }
    }

    /// Builds the styled erase path for a finished gesture
    pub fn create_path(&self, points: &[Pos2]) -> ErasePath {
        let points = if self.config.decimate > 0.0 {
            let zoom = self.canvas.viewport_transform().zoom();
            let distance = if zoom > 0.0 { self.config.decimate / zoom } else { self.config.decimate };
            self.collector.decimate(points, distance)
        } else {
            points.to_vec()
        };
        let commands = self.collector.build_path_data(&points);
        let path = ErasePath::from_commands(commands, self.config.width);
        if self.config.inverted {
            path.with_style(Color32::WHITE, 1.0, CompositeOperation::SourceOver)
        } else {
            path.with_style(Color32::BLACK, self.config.opacity(), CompositeOperation::DestinationOut)
        }
    }

    /// Runs the commit pipeline; use after preventing `end` to commit manually
    pub fn commit(&self, request: EraseRequest) -> BoxFuture<'static, CommitOutcome> {
        erase::commit(Arc::clone(&self.canvas), Arc::clone(&self.cloner), request).boxed()
    }

    /// Reallocates the effect buffer after the canvas was resized
    pub fn resize(&mut self) -> EraserResult<()> {
        self.effect.resize(self.canvas.as_ref())
    }

    /// Releases the effect buffer's storage
    pub fn dispose(&mut self) {
        self.effect.dispose();
        self.active = false;
        debug!("Eraser brush disposed");
    }

    fn finalize(&mut self, points: Vec<Pos2>) -> StrokeEnd {
        if points.len() < 2 {
            self.events.emit(&ErasingEvent::Cancel);
            clear_and_render(self.canvas.as_ref());
            return StrokeEnd::Cancelled;
        }

        let path = self.create_path(&points);
        let targets = walk(&self.canvas.elements(), &path);
        let request = EraseRequest::new(path, targets);
        if self.events.emit(&ErasingEvent::End(&request)).default_prevented() {
            debug!("Erasing end prevented; {} target(s) left uncommitted", request.targets.len());
            clear_and_render(self.canvas.as_ref());
            return StrokeEnd::Prevented(request);
        }

        info!("Erasing stroke finished with {} target(s)", request.targets.len());
        let commit = self.commit(request);
        let canvas = Arc::clone(&self.canvas);
        StrokeEnd::Committing(
            async move {
                let outcome = commit.await;
                clear_and_render(canvas.as_ref());
                outcome
            }
            .boxed(),
        )
    }
}

fn clear_and_render(canvas: &dyn Canvas) {
    canvas.clear_top_context();
    canvas.request_render_all();
}
