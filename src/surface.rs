use egui::{Color32, Pos2, Rect};
use image::{Rgba, RgbaImage};

use crate::error::{EraserError, EraserResult};
use crate::geometry::{calculate_bounds, distance_to_line_segment};
use crate::path::CompositeOperation;

/// Largest width or height of a surface, in device pixels
pub const MAX_SIDE: u32 = 32_767;
/// Largest pixel count of a surface
pub const MAX_PIXELS: u64 = 16_384 * 16_384;

/// An RGBA raster with straight (non-premultiplied) alpha.
///
/// Backs the off-screen effect buffer and the canvas's transient top context.
#[derive(Clone)]
pub struct Surface {
    pixels: RgbaImage,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Surface {
    /// Allocates a transparent surface; fails for empty or unrepresentable sizes
    pub fn new(width: u32, height: u32) -> EraserResult<Self> {
        let unavailable = || EraserError::ContextUnavailable { width, height };
        if width == 0 || height == 0 {
            return Err(unavailable());
        }
        if width > MAX_SIDE || height > MAX_SIDE || width as u64 * height as u64 > MAX_PIXELS {
            return Err(unavailable());
        }
        let len = width as usize * height as usize * 4;
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(len).map_err(|_| unavailable())?;
        buffer.resize(len, 0);
        let pixels = RgbaImage::from_raw(width, height, buffer).ok_or_else(unavailable)?;
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|pixel| pixel.0[3] == 0)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let [r, g, b, a] = self.pixels.get_pixel(x, y).0;
        Some(Color32::from_rgba_unmultiplied(r, g, b, a))
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Source-over fill of a device-space rectangle
    pub fn fill_rect(&mut self, rect: Rect, color: Color32) {
        let source = to_rgba(color);
        for (x, y) in self.covered_pixels(rect) {
            let pixel = self.pixels.get_pixel_mut(x, y);
            *pixel = blend(*pixel, source, CompositeOperation::SourceOver, 1.0);
        }
    }

    /// Strokes a polyline with round joins and caps; a single point paints a dot
    pub fn stroke_polyline(&mut self, points: &[Pos2], width: f32, color: Color32) {
        if points.is_empty() || width <= 0.0 {
            return;
        }
        let radius = width / 2.0;
        let source = to_rgba(color);
        let bounds = calculate_bounds(points, radius);

        for (x, y) in self.covered_pixels(bounds) {
            let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
            let hit = if points.len() == 1 {
                center.distance(points[0]) <= radius
            } else {
                points
                    .windows(2)
                    .any(|segment| distance_to_line_segment(center, segment[0], segment[1]) <= radius)
            };
            if hit {
                let pixel = self.pixels.get_pixel_mut(x, y);
                *pixel = blend(*pixel, source, CompositeOperation::SourceOver, 1.0);
            }
        }
    }

    /// Composites `source` onto this surface, pixel-aligned at the origin.
    /// Only the overlapping area is touched.
    pub fn composite(&mut self, source: &Surface, operation: CompositeOperation, opacity: f32) {
        let width = self.width().min(source.width());
        let height = self.height().min(source.height());
        let opacity = opacity.clamp(0.0, 1.0);
        for y in 0..height {
            for x in 0..width {
                let src = *source.pixels.get_pixel(x, y);
                let dst = self.pixels.get_pixel_mut(x, y);
                *dst = blend(*dst, src, operation, opacity);
            }
        }
    }

    /// Per-channel linear interpolation towards `other` by `t`
    pub fn mix(&mut self, other: &Surface, t: f32) {
        let width = self.width().min(other.width());
        let height = self.height().min(other.height());
        let t = t.clamp(0.0, 1.0);
        for y in 0..height {
            for x in 0..width {
                let target = other.pixels.get_pixel(x, y).0;
                let pixel = self.pixels.get_pixel_mut(x, y);
                for (channel, towards) in pixel.0.iter_mut().zip(target) {
                    let value = *channel as f32 + (towards as f32 - *channel as f32) * t;
                    *channel = value.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }

    fn covered_pixels(&self, rect: Rect) -> impl Iterator<Item = (u32, u32)> + use<> {
        let clamp = |v: f32, max: u32| v.clamp(0.0, max as f32) as u32;
        let (x0, x1, y0, y1) = if rect.is_positive() && rect.is_finite() {
            (
                clamp(rect.min.x.floor(), self.width()),
                clamp(rect.max.x.ceil(), self.width()),
                clamp(rect.min.y.floor(), self.height()),
                clamp(rect.max.y.ceil(), self.height()),
            )
        } else {
            (0, 0, 0, 0)
        };
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
    }
}

fn to_rgba(color: Color32) -> Rgba<u8> {
    Rgba(color.to_srgba_unmultiplied())
}

fn blend(dst: Rgba<u8>, src: Rgba<u8>, operation: CompositeOperation, opacity: f32) -> Rgba<u8> {
    let sa = src.0[3] as f32 / 255.0 * opacity;
    let da = dst.0[3] as f32 / 255.0;

    let (out_a, rgb) = match operation {
        CompositeOperation::SourceOver => {
            let out_a = sa + da * (1.0 - sa);
            let mut rgb = [0.0; 3];
            if out_a > 0.0 {
                for (i, channel) in rgb.iter_mut().enumerate() {
                    *channel = (src.0[i] as f32 * sa + dst.0[i] as f32 * da * (1.0 - sa)) / out_a;
                }
            }
            (out_a, rgb)
        }
        CompositeOperation::SourceIn => (
            sa * da,
            [src.0[0] as f32, src.0[1] as f32, src.0[2] as f32],
        ),
        CompositeOperation::DestinationOut => (
            da * (1.0 - sa),
            [dst.0[0] as f32, dst.0[1] as f32, dst.0[2] as f32],
        ),
    };

    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    Rgba([channel(rgb[0]), channel(rgb[1]), channel(rgb[2]), channel(out_a * 255.0)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_zero_sized_surface_is_unavailable() {
        let err = Surface::new(0, 10).unwrap_err();
        assert!(matches!(err, EraserError::ContextUnavailable { width: 0, height: 10 }));
    }

    #[test]
    fn test_oversized_surface_is_unavailable() {
        let err = Surface::new(1 << 31, 1 << 30).unwrap_err();
        assert!(matches!(err, EraserError::ContextUnavailable { width: 2147483648, height: 1073741824 }));

        assert!(Surface::new(MAX_SIDE + 1, 1).is_err());
        assert!(Surface::new(MAX_SIDE, MAX_SIDE).is_err());
        assert!(Surface::new(MAX_SIDE, 1).is_ok());
    }

    #[test]
    fn test_source_in_keeps_source_only_under_destination() {
        let mut mask = Surface::new(4, 1).unwrap();
        mask.fill_rect(Rect::from_min_max(pos2(0.0, 0.0), pos2(2.0, 1.0)), Color32::BLACK);

        let mut effect = Surface::new(4, 1).unwrap();
        effect.fill_rect(Rect::from_min_max(pos2(0.0, 0.0), pos2(4.0, 1.0)), Color32::RED);

        mask.composite(&effect, CompositeOperation::SourceIn, 1.0);
        assert_eq!(mask.pixel(0, 0), Some(Color32::RED));
        assert_eq!(mask.pixel(3, 0), Some(Color32::TRANSPARENT));
    }

    #[test]
    fn test_destination_out_with_partial_opacity() {
        let mut canvas = Surface::new(1, 1).unwrap();
        canvas.fill_rect(Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)), Color32::WHITE);

        let mut stroke = Surface::new(1, 1).unwrap();
        stroke.fill_rect(Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)), Color32::BLACK);

        canvas.composite(&stroke, CompositeOperation::DestinationOut, 0.5);
        let alpha = canvas.as_image().get_pixel(0, 0).0[3];
        assert!((127..=128).contains(&alpha));
    }

    #[test]
    fn test_stroke_polyline_covers_segment() {
        let mut surface = Surface::new(20, 20).unwrap();
        surface.stroke_polyline(&[pos2(2.0, 10.0), pos2(18.0, 10.0)], 4.0, Color32::BLACK);
        assert_eq!(surface.pixel(10, 10), Some(Color32::BLACK));
        assert_eq!(surface.pixel(10, 2), Some(Color32::TRANSPARENT));
    }
}
