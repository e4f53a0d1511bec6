use std::ops::Mul;

use egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

const SINGULAR_EPSILON: f32 = 1e-9;

/// 2D affine transform in canvas matrix order `[a b c d e f]`:
///
/// ```text
/// x' = a * x + c * y + e
/// y' = b * x + d * y + f
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn to_array(self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    pub fn translate(offset: Vec2) -> Self {
        Self {
            e: offset.x,
            f: offset.y,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Rotation by `radians`, clockwise in a y-down canvas
    pub fn rotate(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `self · other`: applies `other` first, then `self`
    pub fn multiply(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Returns `None` for degenerate (zero-area) transforms
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON || !det.is_finite() {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    pub fn apply(&self, p: Pos2) -> Pos2 {
        pos2(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Axis-aligned bounds of `rect` after mapping its four corners
    pub fn apply_rect(&self, rect: Rect) -> Rect {
        if !rect.is_finite() || rect == Rect::NOTHING {
            return Rect::NOTHING;
        }
        let corners = [
            self.apply(rect.left_top()),
            self.apply(rect.right_top()),
            self.apply(rect.left_bottom()),
            self.apply(rect.right_bottom()),
        ];
        Rect::from_points(&corners)
    }

    pub fn translation(&self) -> Vec2 {
        vec2(self.e, self.f)
    }

    /// Length of the transformed unit axes
    pub fn scaling(&self) -> Vec2 {
        vec2(
            (self.a * self.a + self.b * self.b).sqrt(),
            (self.c * self.c + self.d * self.d).sqrt(),
        )
    }

    /// Viewport zoom, read from the horizontal scale entry like the host canvas does
    pub fn zoom(&self) -> f32 {
        self.a
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array())
            .all(|(lhs, rhs)| (lhs - rhs).abs() <= epsilon)
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.multiply(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_composes_to_identity() {
        let m = Transform::translate(vec2(30.0, -12.0))
            * Transform::rotate(0.7)
            * Transform::scale(2.0, 0.5);
        let inverse = m.invert().unwrap();
        assert!((m * inverse).approx_eq(&Transform::IDENTITY, 1e-5));
        assert!((inverse * m).approx_eq(&Transform::IDENTITY, 1e-5));
    }

    #[test]
    fn test_multiplication_order() {
        let t = Transform::translate(vec2(10.0, 0.0));
        let s = Transform::scale(2.0, 2.0);
        // scale first, then translate
        assert_eq!((t * s).apply(pos2(1.0, 1.0)), pos2(12.0, 2.0));
        // translate first, then scale
        assert_eq!((s * t).apply(pos2(1.0, 1.0)), pos2(22.0, 2.0));
    }

    #[test]
    fn test_singular_transform_has_no_inverse() {
        assert!(Transform::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_apply_rect_under_rotation() {
        let rect = Rect::from_center_size(Pos2::ZERO, vec2(2.0, 2.0));
        let rotated = Transform::rotate(std::f32::consts::FRAC_PI_4).apply_rect(rect);
        let half_diagonal = 2.0_f32.sqrt();
        assert!((rotated.max.x - half_diagonal).abs() < 1e-5);
        assert!((rotated.min.y + half_diagonal).abs() < 1e-5);
    }
}
