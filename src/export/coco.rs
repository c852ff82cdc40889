// COCO JSON format export
// http://cocodataset.org/#format-data

use crate::error::{ExportError, ValidationError};
use crate::geometry::{Annotation, polygon};
use crate::persistence::ImageMeta;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoInfo {
    pub year: i32,
    pub version: String,
    pub description: String,
    pub contributor: String,
    pub date_created: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u64,
    pub width: u32,
    pub height: u32,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u32,
    pub bbox: [f64; 4], // [x, y, width, height]
    pub area: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segmentation: Vec<Vec<f64>>, // [[x1, y1, x2, y2, ...]]
    pub iscrowd: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CocoDataset {
    pub info: CocoInfo,
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
}

impl Default for CocoDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl CocoDataset {
    pub fn new() -> Self {
        let now = chrono::Local::now();
        CocoDataset {
            info: CocoInfo {
                year: now.year(),
                version: "1.0".to_string(),
                description: "Dataset exported from annotator".to_string(),
                contributor: "annotator".to_string(),
                date_created: now.format("%Y-%m-%d").to_string(),
            },
            images: Vec::new(),
            annotations: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn add_category(&mut self, id: u32, name: String) {
        self.categories.push(CocoCategory {
            id,
            name,
            supercategory: "object".to_string(),
        });
    }

    /// Register an image under `coco_id` (its 1-based position in the export).
    pub fn add_image(&mut self, coco_id: u64, image: &ImageMeta) {
        self.images.push(CocoImage {
            id: coco_id,
            width: image.width,
            height: image.height,
            file_name: image.basename().to_string(),
        });
    }

    /// Append one annotation in absolute pixels. Ids run from 1.
    pub fn add_annotation(
        &mut self,
        image_id: u64,
        category_id: u32,
        ann: &Annotation,
    ) -> Result<(), ValidationError> {
        ann.validate()?;
        let bbox = ann.bounding_box();
        if bbox.is_degenerate() {
            return Err(ValidationError::DegenerateBox {
                width: bbox.width,
                height: bbox.height,
            });
        }
        let segmentation = polygon::order_clockwise(ann.vertices())
            .iter()
            .flat_map(|p| [p.x as f64, p.y as f64])
            .collect();

        let (w, h) = (bbox.width as f64, bbox.height as f64);
        self.annotations.push(CocoAnnotation {
            id: self.annotations.len() as u64 + 1,
            image_id,
            category_id,
            bbox: [bbox.x as f64, bbox.y as f64, w, h],
            area: w * h,
            segmentation: vec![segmentation],
            iscrowd: 0,
        });
        Ok(())
    }

    pub fn to_json(&self) -> Result<Vec<u8>, ExportError> {
        serde_json::to_vec_pretty(self).map_err(|e| ExportError::Encode {
            file: "annotations.json".to_string(),
            detail: e.to_string(),
        })
    }
}
