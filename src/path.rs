use std::fmt::Write as _;

use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::geometry::{Transform, calculate_bounds};

/// A single SVG-style path segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum PathCommand {
    MoveTo { to: Pos2 },
    LineTo { to: Pos2 },
    QuadTo { ctrl: Pos2, to: Pos2 },
}

impl PathCommand {
    /// End point plus any control point, in command order
    pub fn points(&self) -> impl Iterator<Item = Pos2> + use<> {
        let (ctrl, to) = match *self {
            Self::MoveTo { to } | Self::LineTo { to } => (None, to),
            Self::QuadTo { ctrl, to } => (Some(ctrl), to),
        };
        ctrl.into_iter().chain(std::iter::once(to))
    }

    pub fn map_points(self, f: impl Fn(Pos2) -> Pos2) -> Self {
        match self {
            Self::MoveTo { to } => Self::MoveTo { to: f(to) },
            Self::LineTo { to } => Self::LineTo { to: f(to) },
            Self::QuadTo { ctrl, to } => Self::QuadTo {
                ctrl: f(ctrl),
                to: f(to),
            },
        }
    }

    fn write_svg(&self, out: &mut String) {
        let _ = match self {
            Self::MoveTo { to } => write!(out, "M {} {}", to.x, to.y),
            Self::LineTo { to } => write!(out, "L {} {}", to.x, to.y),
            Self::QuadTo { ctrl, to } => write!(out, "Q {} {} {} {}", ctrl.x, ctrl.y, to.x, to.y),
        };
    }
}

/// How a path combines with the content already under it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOperation {
    /// Paints over existing content (used to restore erased regions)
    #[default]
    SourceOver,
    /// Keeps the source only where the destination is opaque
    SourceIn,
    /// Cuts the source shape out of existing content
    DestinationOut,
}

/// A finalized erase stroke.
///
/// Commands are stored relative to the center of their bounds; `transform`
/// places them on the canvas (or, after erase application, inside a target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErasePath {
    commands: Vec<PathCommand>,
    transform: Transform,
    stroke_width: f32,
    stroke: Color32,
    opacity: f32,
    composite: CompositeOperation,
}

impl ErasePath {
    /// Build a path from commands expressed in canvas space
    pub fn from_commands(commands: Vec<PathCommand>, stroke_width: f32) -> Self {
        let points: Vec<Pos2> = commands.iter().flat_map(PathCommand::points).collect();
        let center = if points.is_empty() {
            Pos2::ZERO
        } else {
            calculate_bounds(&points, 0.0).center()
        };
        let offset = center.to_vec2();
        let commands = commands
            .into_iter()
            .map(|command| command.map_points(|p| p - offset))
            .collect();

        Self {
            commands,
            transform: Transform::translate(offset),
            stroke_width,
            stroke: Color32::BLACK,
            opacity: 1.0,
            composite: CompositeOperation::DestinationOut,
        }
    }

    pub fn with_style(mut self, stroke: Color32, opacity: f32, composite: CompositeOperation) -> Self {
        self.stroke = stroke;
        self.opacity = opacity.clamp(0.0, 1.0);
        self.composite = composite;
        self
    }

    /// Commands in path-local space
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn stroke(&self) -> Color32 {
        self.stroke
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn composite(&self) -> CompositeOperation {
        self.composite
    }

    /// Bounds of the control polygon in path-local space
    pub fn local_bounds(&self) -> Rect {
        let points: Vec<Pos2> = self.commands.iter().flat_map(PathCommand::points).collect();
        calculate_bounds(&points, 0.0)
    }

    /// Bounds in the space `transform` maps into, including half the stroke width
    pub fn bounding_rect(&self) -> Rect {
        let rect = self.transform.apply_rect(self.local_bounds());
        if rect == Rect::NOTHING {
            return rect;
        }
        let half_width = self.stroke_width / 2.0 * self.transform.scaling().max_elem();
        rect.expand(half_width)
    }

    /// All command points mapped through `transform`
    pub fn placed_points(&self) -> Vec<Pos2> {
        self.commands
            .iter()
            .flat_map(PathCommand::points)
            .map(|p| self.transform.apply(p))
            .collect()
    }

    /// Offset of the path-local origin in placed space
    pub fn offset(&self) -> Vec2 {
        self.transform.translation()
    }

    /// SVG path data of the local commands, e.g. `M 0 0 Q 1 1 2 2 L 3 3`
    pub fn to_svg_path_data(&self) -> String {
        let mut out = String::new();
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            command.write_svg(&mut out);
        }
        out
    }
}
