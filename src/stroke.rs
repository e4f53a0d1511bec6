use egui::Pos2;

use crate::path::PathCommand;

/// Base brush behavior the eraser is composed with: collects the points of a
/// gesture and turns them into path data.
pub trait StrokeCollector: Send {
    /// Resets collection and records the first point
    fn begin(&mut self, point: Pos2);

    /// Returns `true` if the point was kept
    fn collect_point(&mut self, point: Pos2) -> bool;

    /// Points collected so far in the current gesture
    fn points(&self) -> &[Pos2];

    /// Ends collection and hands over the collected points
    fn finalize_points(&mut self) -> Vec<Pos2>;

    /// Drops points closer than `distance` to the previously kept one,
    /// always keeping the first and last point
    fn decimate(&self, points: &[Pos2], distance: f32) -> Vec<Pos2>;

    fn build_path_data(&self, points: &[Pos2]) -> Vec<PathCommand>;
}

/// Freehand point collector producing quadratic-smoothed paths
#[derive(Debug, Clone, Default)]
pub struct PencilCollector {
    points: Vec<Pos2>,
}

impl PencilCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StrokeCollector for PencilCollector {
    fn begin(&mut self, point: Pos2) {
        self.points.clear();
        self.points.push(point);
    }

    fn collect_point(&mut self, point: Pos2) -> bool {
        // repeated pointer positions add nothing to the path
        if self.points.last() == Some(&point) {
            return false;
        }
        self.points.push(point);
        true
    }

    fn points(&self) -> &[Pos2] {
        &self.points
    }

    fn finalize_points(&mut self) -> Vec<Pos2> {
        std::mem::take(&mut self.points)
    }

    fn decimate(&self, points: &[Pos2], distance: f32) -> Vec<Pos2> {
        if points.len() <= 2 || distance <= 0.0 {
            return points.to_vec();
        }
        let min_distance_sq = distance * distance;
        let last = points.len() - 1;

        let mut kept = vec![points[0]];
        let mut anchor = points[0];
        for &point in &points[1..last] {
            if (point - anchor).length_sq() >= min_distance_sq {
                anchor = point;
                kept.push(point);
            }
        }
        kept.push(points[last]);
        kept
    }

    fn build_path_data(&self, points: &[Pos2]) -> Vec<PathCommand> {
        let Some(&first) = points.first() else {
            return Vec::new();
        };
        let mut commands = vec![PathCommand::MoveTo { to: first }];

        // each point becomes the control of a curve ending halfway to the next one
        let mut p1 = first;
        let mut p2 = points.get(1).copied().unwrap_or(first);
        for i in 1..points.len() {
            if p1 != p2 {
                commands.push(PathCommand::QuadTo {
                    ctrl: p1,
                    to: p1 + (p2 - p1) / 2.0,
                });
            }
            p1 = points[i];
            if let Some(&next) = points.get(i + 1) {
                p2 = next;
            }
        }
        commands.push(PathCommand::LineTo { to: p1 });
        commands
    }
}
