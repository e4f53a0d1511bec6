use log::{debug, warn};

use crate::canvas::{Canvas, SnapshotPass};
use crate::error::EraserResult;
use crate::surface::Surface;

/// Parameters for rendering the erase preview
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectOptions {
    /// Erase intensity, from the brush color's alpha
    pub opacity: f32,
    pub inverted: bool,
}

/// Low-level routine that paints the masking image for a stroke preview
pub trait EffectPainter: Send + Sync {
    fn paint(&self, target: &mut Surface, options: EffectOptions, canvas: &dyn Canvas) -> EraserResult<()>;
}

/// Builds the effect from canvas snapshots.
///
/// Erasing shows the canvas blended towards its non-erasable content by the
/// erase opacity; inverted erasing shows the canvas with erasures ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotPainter;

impl EffectPainter for SnapshotPainter {
    fn paint(&self, target: &mut Surface, options: EffectOptions, canvas: &dyn Canvas) -> EraserResult<()> {
        if options.inverted {
            canvas.render_snapshot(SnapshotPass::Restored, target);
            return Ok(());
        }

        canvas.render_snapshot(SnapshotPass::Full, target);
        let mut retained = Surface::new(target.width(), target.height())?;
        canvas.render_snapshot(SnapshotPass::Retained, &mut retained);
        target.mix(&retained, options.opacity);
        Ok(())
    }
}

/// Off-screen scratch buffer for the live erase preview, sized to the canvas
/// in device pixels
#[derive(Debug)]
pub struct EffectBuffer {
    surface: Option<Surface>,
}

impl EffectBuffer {
    pub fn for_canvas(canvas: &dyn Canvas) -> EraserResult<Self> {
        let (width, height) = canvas.device_size();
        let surface = Surface::new(width, height)?;
        debug!("Created {}x{} effect buffer", width, height);
        Ok(Self {
            surface: Some(surface),
        })
    }

    /// `None` once disposed
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Reallocates to the canvas's current size
    pub fn resize(&mut self, canvas: &dyn Canvas) -> EraserResult<()> {
        *self = Self::for_canvas(canvas)?;
        Ok(())
    }

    /// Clears the buffer and paints a fresh effect into it
    pub fn draw(&mut self, painter: &dyn EffectPainter, options: EffectOptions, canvas: &dyn Canvas) -> EraserResult<()> {
        let Some(surface) = self.surface.as_mut() else {
            warn!("Effect buffer was disposed; skipping effect redraw");
            return Ok(());
        };
        surface.clear();
        painter.paint(surface, options, canvas)
    }

    /// Releases the backing storage
    pub fn dispose(&mut self) {
        self.surface = None;
    }
}
