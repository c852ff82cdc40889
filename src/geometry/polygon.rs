//! Polygon helpers: point-in-polygon, winding, vertex clean-up.

use super::Point;

/// Even-odd ray casting test.
pub fn contains(vertices: &[Point], p: Point) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Arithmetic mean of the vertices.
pub fn centroid(vertices: &[Point]) -> Point {
    if vertices.is_empty() {
        return Point::default();
    }
    let n = vertices.len() as f32;
    let sum = vertices.iter().fold(Point::default(), |acc, &p| acc + p);
    Point::new(sum.x / n, sum.y / n)
}

/// Shoelace area. Positive means clockwise on screen, where y grows downwards.
pub fn signed_area(vertices: &[Point]) -> f32 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

pub fn area(vertices: &[Point]) -> f32 {
    signed_area(vertices).abs()
}

/// Reorder vertices by ascending angle around their centroid.
///
/// In image space (y down) ascending `atan2` runs clockwise on screen. The
/// sequence is rotated so it still starts at the input's first vertex, which
/// makes the operation leave an already-clockwise convex polygon untouched.
pub fn order_clockwise(vertices: &[Point]) -> Vec<Point> {
    if vertices.len() < 3 {
        return vertices.to_vec();
    }
    let c = centroid(vertices);
    let mut indexed: Vec<(usize, f32, f32)> = vertices
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            let d = p - c;
            (i, d.y.atan2(d.x), d.length_squared())
        })
        .collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.2.total_cmp(&b.2)));

    let start = indexed.iter().position(|(i, _, _)| *i == 0).unwrap_or(0);
    indexed.rotate_left(start);
    indexed.into_iter().map(|(i, _, _)| vertices[i]).collect()
}

/// Drop vertices closer than `epsilon` to their predecessor (wrapping around),
/// but never go below three vertices.
pub fn prune_near_duplicates(vertices: &[Point], epsilon: f32) -> Vec<Point> {
    let mut kept: Vec<Point> = Vec::with_capacity(vertices.len());
    let mut remaining = vertices.len();
    for &v in vertices {
        if let Some(&last) = kept.last() {
            if remaining > 3 && last.distance_to(v) < epsilon {
                remaining -= 1;
                continue;
            }
        }
        kept.push(v);
    }
    while kept.len() > 3 {
        match (kept.first(), kept.last()) {
            (Some(&first), Some(&last)) if first.distance_to(last) < epsilon => {
                kept.pop();
            }
            _ => break,
        }
    }
    kept
}

/// True if any two consecutive vertices (wrapping) are closer than `epsilon`.
pub fn has_near_duplicates(vertices: &[Point], epsilon: f32) -> bool {
    let n = vertices.len();
    (0..n).any(|i| n > 1 && vertices[i].distance_to(vertices[(i + 1) % n]) < epsilon)
}

/// Number of pairwise-distinct vertices.
pub fn distinct_count(vertices: &[Point]) -> usize {
    let mut distinct: Vec<Point> = Vec::with_capacity(vertices.len());
    for &v in vertices {
        if !distinct.contains(&v) {
            distinct.push(v);
        }
    }
    distinct.len()
}
