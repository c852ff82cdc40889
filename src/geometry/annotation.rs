//! The annotation record and its invariants.
//!
//! Vertices are the source of truth. The bounding box is a cache that is
//! recomputed after every vertex mutation.

use super::{BoundingBox, Point, polygon};
use crate::error::ValidationError;
use crate::utils::{format_hex_rgb, parse_hex_rgb};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type AnnotationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned box that has never been resized through a handle.
    Rectangle,
    Polygon,
}

/// Display colour of an annotation, stored as "#rrggbb".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        parse_hex_rgb(hex).map(|[r, g, b]| Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format_hex_rgb([self.r, self.g, self.b])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0xff, 0x00, 0x00)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Color::from_hex(&hex)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid colour '{hex}'")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    kind: ShapeKind,
    vertices: Vec<Point>,
    bbox: BoundingBox,
    pub label: String,
    pub color: Color,
    pub locked: bool,
}

impl Annotation {
    /// Rectangle stored as four vertices, clockwise from the top-left.
    pub fn rectangle(id: AnnotationId, bbox: BoundingBox, label: impl Into<String>) -> Self {
        Self {
            id,
            kind: ShapeKind::Rectangle,
            vertices: bbox.corners().to_vec(),
            bbox,
            label: label.into(),
            color: Color::default(),
            locked: false,
        }
    }

    /// Polygon from raw vertices. Returns `None` for fewer than three vertices.
    pub fn polygon(
        id: AnnotationId,
        vertices: Vec<Point>,
        label: impl Into<String>,
    ) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let bbox = BoundingBox::from_points(&vertices);
        Some(Self {
            id,
            kind: ShapeKind::Polygon,
            vertices,
            bbox,
            label: label.into(),
            color: Color::default(),
            locked: false,
        })
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Permanently switch to the polygon representation. Rectangles emit their
    /// four bbox corners; polygons are left alone.
    pub fn to_polygon(&mut self) {
        if self.kind == ShapeKind::Rectangle {
            self.vertices = self.bbox.corners().to_vec();
            self.kind = ShapeKind::Polygon;
        }
    }

    pub fn recompute_bounding_box(&mut self) {
        self.bbox = BoundingBox::from_points(&self.vertices);
    }

    /// Apply a vertex mutation. The shape becomes a polygon and the bbox is
    /// refreshed afterwards.
    pub(crate) fn edit_vertices(&mut self, edit: impl FnOnce(&mut [Point])) {
        self.to_polygon();
        edit(&mut self.vertices);
        self.recompute_bounding_box();
    }

    /// Axis-aligned test for untouched rectangles, even-odd otherwise.
    pub fn contains_point(&self, p: Point) -> bool {
        match self.kind {
            ShapeKind::Rectangle => self.bbox.contains(p),
            ShapeKind::Polygon => polygon::contains(&self.vertices, p),
        }
    }

    /// Whether a freshly drawn shape may be added to the annotation list.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.vertices.iter().all(|v| v.is_finite()) {
            return Err(ValidationError::NonFiniteCoordinate);
        }
        match self.kind {
            ShapeKind::Rectangle if self.bbox.is_degenerate() => {
                Err(ValidationError::DegenerateBox {
                    width: self.bbox.width,
                    height: self.bbox.height,
                })
            }
            ShapeKind::Rectangle => Ok(()),
            ShapeKind::Polygon => {
                let distinct = polygon::distinct_count(&self.vertices);
                if distinct < 3 {
                    Err(ValidationError::TooFewVertices(distinct))
                } else {
                    Ok(())
                }
            }
        }
    }
}
