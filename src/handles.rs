//! Corner and edge handles of the focused annotation.
//!
//! Handles are anchored in image space but drawn at a fixed pixel size on
//! screen, so hit testing happens in view space with a constant tolerance.

use crate::geometry::{Annotation, Point};
use crate::view::ViewTransform;

/// Half-width of the 8px square handle marker.
pub const DEFAULT_HANDLE_TOLERANCE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    /// Sits on `vertices[i]`.
    Corner(usize),
    /// Sits on the midpoint of `vertices[i]` and `vertices[(i + 1) % n]`.
    Edge(usize),
}

/// Capability of shapes that can be reshaped through a handle.
pub trait Resizable {
    /// Move `handle` to `image_pos`. Returns false when nothing changed
    /// (locked shape, stale handle index).
    fn resize(&mut self, handle: Handle, image_pos: Point) -> bool;
}

/// Image-space position of a handle, if it exists on this shape.
pub fn handle_anchor(ann: &Annotation, handle: Handle) -> Option<Point> {
    let v = ann.vertices();
    match handle {
        Handle::Corner(i) => v.get(i).copied(),
        Handle::Edge(i) if i < v.len() => Some(v[i].midpoint(v[(i + 1) % v.len()])),
        Handle::Edge(_) => None,
    }
}

/// All handles of a shape, corners first.
pub fn handles(ann: &Annotation) -> Vec<(Handle, Point)> {
    let n = ann.vertices().len();
    (0..n)
        .map(Handle::Corner)
        .chain((0..n).map(Handle::Edge))
        .filter_map(|h| handle_anchor(ann, h).map(|p| (h, p)))
        .collect()
}

/// Find the handle under a view-space pointer. Corners win over edges; within
/// a class the nearest marker wins. Locked shapes expose no handles.
pub fn hit_test(
    ann: &Annotation,
    view: &ViewTransform,
    pointer: Point,
    tolerance: f32,
) -> Option<Handle> {
    if ann.locked {
        return None;
    }
    let within = |anchor: Point| {
        let d = view.to_view(anchor) - pointer;
        (d.x.abs() <= tolerance && d.y.abs() <= tolerance).then(|| d.length_squared())
    };
    let nearest = |corners: bool| {
        handles(ann)
            .into_iter()
            .filter(|(h, _)| matches!(h, Handle::Corner(_)) == corners)
            .filter_map(|(h, p)| within(p).map(|d| (h, d)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(h, _)| h)
    };
    nearest(true).or_else(|| nearest(false))
}

impl Resizable for Annotation {
    fn resize(&mut self, handle: Handle, image_pos: Point) -> bool {
        if self.locked || !image_pos.is_finite() || handle_anchor(self, handle).is_none() {
            return false;
        }
        match handle {
            Handle::Corner(i) => self.edit_vertices(|v| v[i] = image_pos),
            Handle::Edge(i) => self.edit_vertices(|v| {
                let j = (i + 1) % v.len();
                let shift = edge_residual(v[i], v[j], image_pos);
                v[i] = v[i] + shift;
                v[j] = v[j] + shift;
            }),
        }
        true
    }
}

/// Vector from the projection of `p` onto the line through `a`-`b` to `p`.
/// Translating both endpoints by it moves the edge onto the pointer while
/// keeping its direction.
fn edge_residual(a: Point, b: Point, p: Point) -> Point {
    let dir = b - a;
    let len_sq = dir.length_squared();
    if len_sq <= f32::EPSILON {
        return p - a;
    }
    let t = (p - a).dot(dir) / len_sq;
    let projection = a + dir * t;
    p - projection
}
