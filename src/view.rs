//! Image-space <-> view-space mapping.
//!
//! Stored geometry is always in image space. Pointer input arrives in view
//! space and goes through [`ViewTransform::to_image`] before it touches an
//! annotation.

use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl ViewTransform {
    pub fn new(zoom: f32, pan_x: f32, pan_y: f32) -> Self {
        Self {
            zoom: safe_zoom(zoom),
            pan_x,
            pan_y,
        }
    }

    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    /// `p * zoom + pan`
    pub fn to_view(&self, p: Point) -> Point {
        p * self.zoom + self.pan()
    }

    /// `(p - pan) / zoom`
    pub fn to_image(&self, p: Point) -> Point {
        (p - self.pan()) * (1.0 / self.zoom)
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Zoom by `factor` keeping the image point under `anchor` (view space)
    /// fixed on screen. The resulting zoom is clamped to `[min_zoom, max_zoom]`.
    pub fn zoom_at(&mut self, anchor: Point, factor: f32, min_zoom: f32, max_zoom: f32) {
        let image_anchor = self.to_image(anchor);
        let zoom = safe_zoom(self.zoom * factor).clamp(min_zoom, max_zoom);
        self.zoom = zoom;
        self.pan_x = anchor.x - image_anchor.x * zoom;
        self.pan_y = anchor.y - image_anchor.y * zoom;
    }

    /// Scale so an image of `image_size` fits inside `viewport`, centred.
    pub fn fit(image_size: (f32, f32), viewport: (f32, f32)) -> Self {
        let (iw, ih) = image_size;
        let (vw, vh) = viewport;
        if iw <= 0.0 || ih <= 0.0 {
            return Self::default();
        }
        let zoom = safe_zoom((vw / iw).min(vh / ih));
        Self {
            zoom,
            pan_x: (vw - iw * zoom) / 2.0,
            pan_y: (vh - ih * zoom) / 2.0,
        }
    }
}

/// Non-positive or non-finite zoom falls back to 1.0.
fn safe_zoom(zoom: f32) -> f32 {
    if zoom <= 0.0 || !zoom.is_finite() {
        1.0
    } else {
        zoom
    }
}
