//! Image annotation core: shape editing in image space, view mapping, handle
//! interaction, and dataset export to YOLO detection, YOLO segmentation, and
//! COCO formats.

pub mod classes;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod handles;
pub mod persistence;
pub mod state;
pub mod utils;
pub mod view;

pub use error::{ConfigError, ExportError, ResourceError, ValidationError};
pub use export::{ExportFormat, ExportOptions, ExportRequest, ExportSummary, run_export};
pub use geometry::{Annotation, BoundingBox, Point, ShapeKind};
pub use persistence::{ImageMeta, Persistence, ProjectSnapshot, VisualFilter};
pub use state::{AnnotationSession, DatasetStore, Editor};
pub use view::ViewTransform;
