// YOLO polygon segmentation label format
// https://docs.ultralytics.com/datasets/segment/

use super::yolo::fmt_norm;
use crate::error::ValidationError;
use crate::geometry::{BoundingBox, Point, polygon};
use crate::persistence::ImageMeta;

/// Vertices as they will be written: clockwise, normalized, near-duplicates
/// pruned. Fails on a flat outline or if fewer than three usable vertices
/// are left.
pub fn normalized_vertices(
    vertices: &[Point],
    image: &ImageMeta,
    epsilon: f32,
) -> Result<Vec<Point>, ValidationError> {
    if !vertices.iter().all(|v| v.is_finite()) {
        return Err(ValidationError::NonFiniteCoordinate);
    }
    // Positive axis scaling keeps the angular order, so order in pixels.
    let bbox = BoundingBox::from_points(vertices);
    if bbox.is_degenerate() {
        return Err(ValidationError::DegenerateBox {
            width: bbox.width,
            height: bbox.height,
        });
    }
    let ordered = polygon::order_clockwise(vertices);
    if polygon::area(&ordered) <= 0.0 {
        return Err(ValidationError::ZeroArea);
    }
    let img_w = image.width as f32;
    let img_h = image.height as f32;
    let normalized: Vec<Point> = ordered
        .iter()
        .map(|p| Point::new(p.x / img_w, p.y / img_h))
        .collect();

    let pruned = polygon::prune_near_duplicates(&normalized, epsilon);
    let usable = usable_count(&pruned, epsilon);
    if usable < 3 {
        return Err(ValidationError::TooFewVertices(usable));
    }
    Ok(pruned)
}

/// Vertices at least `epsilon` away from their successor.
fn usable_count(vertices: &[Point], epsilon: f32) -> usize {
    let n = vertices.len();
    if n < 2 {
        return n;
    }
    (0..n)
        .filter(|&i| vertices[i].distance_to(vertices[(i + 1) % n]) >= epsilon)
        .count()
}

/// `classId x1 y1 x2 y2 ... xn yn`
pub fn encode_polygon(
    vertices: &[Point],
    image: &ImageMeta,
    class_id: u32,
    epsilon: f32,
) -> Result<String, ValidationError> {
    let points = normalized_vertices(vertices, image, epsilon)?;
    let mut line = class_id.to_string();
    for p in &points {
        line.push(' ');
        line.push_str(&fmt_norm(p.x as f64));
        line.push(' ');
        line.push_str(&fmt_norm(p.y as f64));
    }
    Ok(line)
}
