// YOLO detection label format
// https://docs.ultralytics.com/datasets/detect/

use crate::error::{ExportError, ValidationError};
use crate::geometry::BoundingBox;
use crate::persistence::ImageMeta;
use serde::Serialize;

/// Normalized coordinates are always written with six decimals.
pub(crate) fn fmt_norm(v: f64) -> String {
    format!("{:.6}", v.clamp(0.0, 1.0))
}

/// `classId centerX centerY width height`, normalized by the image size.
pub fn encode_bbox(
    bbox: &BoundingBox,
    image: &ImageMeta,
    class_id: u32,
) -> Result<String, ValidationError> {
    if bbox.is_degenerate() {
        return Err(ValidationError::DegenerateBox {
            width: bbox.width,
            height: bbox.height,
        });
    }
    let img_w = image.width as f64;
    let img_h = image.height as f64;
    let (x, y, w, h) = (
        bbox.x as f64,
        bbox.y as f64,
        bbox.width as f64,
        bbox.height as f64,
    );

    Ok(format!(
        "{} {} {} {} {}",
        class_id,
        fmt_norm((x + w / 2.0) / img_w),
        fmt_norm((y + h / 2.0) / img_h),
        fmt_norm(w / img_w),
        fmt_norm(h / img_h),
    ))
}

/// Label file body: one record per line, trailing newline unless empty.
pub fn label_file(records: &[String]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(record);
        out.push('\n');
    }
    out
}

/// `classes.txt`: one name per line, line number == class id.
pub fn classes_file(names: &[String]) -> String {
    label_file(names)
}

#[derive(Debug, Serialize)]
struct DataYaml<'a> {
    path: &'a str,
    train: &'a str,
    val: &'a str,
    nc: usize,
    names: &'a [String],
}

/// Ultralytics-style dataset descriptor.
pub fn data_yaml(names: &[String]) -> Result<String, ExportError> {
    let doc = DataYaml {
        path: ".",
        train: "images/train",
        val: "images/val",
        nc: names.len(),
        names,
    };
    serde_yaml::to_string(&doc).map_err(|e| ExportError::Encode {
        file: "data.yaml".to_string(),
        detail: e.to_string(),
    })
}
