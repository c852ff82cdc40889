//! Dataset loading and saving on the local filesystem.
//!
//! A dataset is a `manifest.json` listing images relative to its folder.
//! Each image's annotations live in `<labels stem>.state.json`.

use crate::error::ResourceError;
use crate::geometry::{Annotation, AnnotationId, BoundingBox, Color, Point, ShapeKind};
use crate::persistence::{ImageId, ImageMeta, Persistence};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFileEntry {
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFile {
    pub images: Vec<DatasetFileEntry>,
}

#[derive(Debug, Clone)]
pub struct DatasetEntry {
    pub image_path: PathBuf,
    pub labels_path: Option<PathBuf>,
    pub size: Option<(u32, u32)>,
}

/// On-disk annotation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAnnotation {
    pub id: AnnotationId,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub vertices: Vec<Point>,
    pub label: String,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub locked: bool,
}

impl From<&Annotation> for StoredAnnotation {
    fn from(a: &Annotation) -> Self {
        Self {
            id: a.id,
            kind: a.kind(),
            vertices: a.vertices().to_vec(),
            label: a.label.clone(),
            color: a.color,
            locked: a.locked,
        }
    }
}

impl StoredAnnotation {
    /// `None` when the record breaks the three-vertex invariant.
    pub fn into_annotation(self) -> Option<Annotation> {
        let ann = match self.kind {
            ShapeKind::Rectangle if self.vertices.len() == 4 => Annotation::rectangle(
                self.id,
                BoundingBox::from_points(&self.vertices),
                self.label,
            ),
            ShapeKind::Rectangle => return None,
            ShapeKind::Polygon => Annotation::polygon(self.id, self.vertices, self.label)?,
        };
        Some(ann.with_color(self.color).with_locked(self.locked))
    }
}

/// Filesystem-backed [`Persistence`]. The project id is the name of the
/// folder holding the manifest; image ids are 1-based manifest positions.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    pub project_id: String,
    pub manifest_path: PathBuf,
    pub entries: Vec<DatasetEntry>,
}

impl DatasetStore {
    /// Load a dataset from a manifest JSON file
    pub async fn open(path: &Path) -> Result<Self, ResourceError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ResourceError::io(path, e))?;
        let parsed: DatasetFile =
            serde_json::from_str(&content).map_err(|e| ResourceError::corrupt(path, e))?;

        let base_dir = path.parent().unwrap_or(Path::new("."));
        let entries = parsed
            .images
            .into_iter()
            .map(|entry| DatasetEntry {
                image_path: base_dir.join(&entry.image),
                labels_path: entry.labels.map(|lp| base_dir.join(lp)),
                size: entry.width.zip(entry.height),
            })
            .collect();

        Ok(Self {
            project_id: project_id_for(path),
            manifest_path: path.to_path_buf(),
            entries,
        })
    }

    pub fn entry(&self, image_id: ImageId) -> Result<&DatasetEntry, ResourceError> {
        usize::try_from(image_id)
            .ok()
            .and_then(|id| id.checked_sub(1))
            .and_then(|idx| self.entries.get(idx))
            .ok_or(ResourceError::ImageNotFound(image_id))
    }

    pub fn image_ids(&self) -> impl Iterator<Item = ImageId> + '_ {
        (1..=self.entries.len()).map(|i| i as ImageId)
    }
}

/// Project id of a manifest: the name of the folder that holds it.
pub fn project_id_for(manifest_path: &Path) -> String {
    manifest_path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

/// Get the label file path for a dataset entry
pub fn label_path_for(entry: &DatasetEntry) -> PathBuf {
    entry
        .labels_path
        .clone()
        .unwrap_or_else(|| entry.image_path.with_extension("txt"))
}

/// Get the state file path for a dataset entry
pub fn state_path_for(entry: &DatasetEntry) -> PathBuf {
    label_path_for(entry).with_extension("state.json")
}

impl Persistence for DatasetStore {
    async fn load_annotations(&self, image_id: ImageId) -> Result<Vec<Annotation>, ResourceError> {
        let state_path = state_path_for(self.entry(image_id)?);
        let text = match tokio::fs::read_to_string(&state_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ResourceError::io(&state_path, e)),
        };
        let stored: Vec<StoredAnnotation> =
            serde_json::from_str(&text).map_err(|e| ResourceError::corrupt(&state_path, e))?;

        let mut anns = Vec::with_capacity(stored.len());
        for record in stored {
            let id = record.id;
            match record.into_annotation() {
                Some(ann) => anns.push(ann),
                None => log::warn!(
                    "Dropping annotation {} in {}: fewer than 3 vertices",
                    id,
                    state_path.display()
                ),
            }
        }
        Ok(anns)
    }

    async fn save_annotations(
        &self,
        image_id: ImageId,
        annotations: &[Annotation],
    ) -> Result<(), ResourceError> {
        let state_path = state_path_for(self.entry(image_id)?);
        let stored: Vec<StoredAnnotation> = annotations.iter().map(StoredAnnotation::from).collect();
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| ResourceError::corrupt(&state_path, e))?;
        if let Some(parent) = state_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ResourceError::io(parent, e))?;
        }
        tokio::fs::write(&state_path, json)
            .await
            .map_err(|e| ResourceError::io(&state_path, e))
    }

    async fn load_image_bytes(&self, image_id: ImageId) -> Result<Vec<u8>, ResourceError> {
        let entry = self.entry(image_id)?;
        tokio::fs::read(&entry.image_path)
            .await
            .map_err(|e| ResourceError::io(&entry.image_path, e))
    }

    async fn load_image_meta(&self, image_id: ImageId) -> Result<ImageMeta, ResourceError> {
        let entry = self.entry(image_id)?;
        let (width, height) = match entry.size {
            Some(size) => size,
            None => image::image_dimensions(&entry.image_path)
                .map_err(|e| ResourceError::corrupt(&entry.image_path, e))?,
        };
        let filename = entry
            .image_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .ok_or_else(|| ResourceError::corrupt(&entry.image_path, "image path has no file name"))?;
        Ok(ImageMeta {
            id: image_id,
            width,
            height,
            filename,
        })
    }

    async fn list_project_images(&self, project_id: &str) -> Result<Vec<ImageMeta>, ResourceError> {
        if project_id != self.project_id {
            return Err(ResourceError::ProjectNotFound(project_id.to_string()));
        }
        let mut images = Vec::with_capacity(self.entries.len());
        for id in self.image_ids() {
            images.push(self.load_image_meta(id).await?);
        }
        Ok(images)
    }
}

/// Create a new dataset manifest from a folder of images
pub fn create_dataset_from_folder(folder: &Path) -> Result<PathBuf, ResourceError> {
    let mut image_files = Vec::new();

    let entries = fs::read_dir(folder).map_err(|e| ResourceError::io(folder, e))?;
    for entry in entries {
        let path = entry.map_err(|e| ResourceError::io(folder, e))?.path();
        if !path.is_file() {
            continue;
        }
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if let (true, Some(filename)) = (is_image, path.file_name()) {
            image_files.push(filename.to_string_lossy().to_string());
        }
    }

    if image_files.is_empty() {
        return Err(ResourceError::Unavailable(format!(
            "no image files found in {}",
            folder.display()
        )));
    }

    // Sort for consistent ordering
    image_files.sort();

    let manifest = DatasetFile {
        images: image_files
            .into_iter()
            .map(|img| DatasetFileEntry {
                labels: Some(Path::new(&img).with_extension("txt").to_string_lossy().to_string()),
                image: img,
                width: None,
                height: None,
            })
            .collect(),
    };

    let manifest_path = folder.join("manifest.json");
    let json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| ResourceError::corrupt(&manifest_path, e))?;
    fs::write(&manifest_path, json).map_err(|e| ResourceError::io(&manifest_path, e))?;
    log::info!("Created manifest {}", manifest_path.display());

    Ok(manifest_path)
}
