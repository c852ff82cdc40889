//! Collaborator interfaces and the export-time project snapshot.

use crate::error::ResourceError;
use crate::geometry::Annotation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub type ImageId = u64;

/// Source image metadata. Width and height are in pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub id: ImageId,
    pub width: u32,
    pub height: u32,
    pub filename: String,
}

impl ImageMeta {
    /// File name without directories.
    pub fn basename(&self) -> &str {
        Path::new(&self.filename)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or(&self.filename)
    }

    /// Basename with its extension replaced, e.g. `frame_01.jpg` -> `frame_01.txt`.
    pub fn with_extension(&self, ext: &str) -> String {
        Path::new(self.basename())
            .with_extension(ext)
            .to_string_lossy()
            .into_owned()
    }
}

/// Storage for annotations and image data.
///
/// Implementations own retry/backoff; callers treat every error as final.
#[allow(async_fn_in_trait)]
pub trait Persistence {
    async fn load_annotations(&self, image_id: ImageId) -> Result<Vec<Annotation>, ResourceError>;

    async fn save_annotations(
        &self,
        image_id: ImageId,
        annotations: &[Annotation],
    ) -> Result<(), ResourceError>;

    async fn load_image_bytes(&self, image_id: ImageId) -> Result<Vec<u8>, ResourceError>;

    async fn load_image_meta(&self, image_id: ImageId) -> Result<ImageMeta, ResourceError>;

    async fn list_project_images(&self, project_id: &str) -> Result<Vec<ImageMeta>, ResourceError>;
}

/// Optional per-image visual filter applied to bundled images.
pub trait VisualFilter {
    fn apply_filter(&self, image_bytes: &[u8], filter_kind: &str) -> Result<Vec<u8>, ResourceError>;
}

/// Immutable copy of a project's images and annotations, taken when an export
/// starts so later edits cannot leak into an in-flight encoding.
#[derive(Debug, Clone, Default)]
pub struct ProjectSnapshot {
    pub project_id: String,
    pub images: Vec<ImageMeta>,
    annotations: HashMap<ImageId, Vec<Annotation>>,
}

impl ProjectSnapshot {
    pub fn new(
        project_id: impl Into<String>,
        images: Vec<ImageMeta>,
        annotations: HashMap<ImageId, Vec<Annotation>>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            images,
            annotations,
        }
    }

    /// Read every image's annotation list, one request at a time.
    pub async fn capture<P: Persistence>(
        persistence: &P,
        project_id: &str,
    ) -> Result<Self, ResourceError> {
        let images = persistence.list_project_images(project_id).await?;
        let mut annotations = HashMap::with_capacity(images.len());
        for image in &images {
            let anns = persistence.load_annotations(image.id).await?;
            log::debug!("Snapshot: image {} has {} annotation(s)", image.id, anns.len());
            annotations.insert(image.id, anns);
        }
        Ok(Self::new(project_id, images, annotations))
    }

    pub fn annotations_for(&self, image_id: ImageId) -> &[Annotation] {
        self.annotations
            .get(&image_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn total_annotations(&self) -> usize {
        self.images
            .iter()
            .map(|img| self.annotations_for(img.id).len())
            .sum()
    }

    /// Labels of every annotation, images in listing order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .flat_map(|img| self.annotations_for(img.id))
            .map(|a| a.label.as_str())
    }
}
