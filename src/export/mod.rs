// Export module for dataset formats
//
// The pipeline: validate options, snapshot the project, resolve class ids,
// partition, encode, bundle images, package.

pub mod archive;
pub mod coco;
pub mod partition;
pub mod segmentation;
pub mod yolo;

use crate::classes::{ClassMapping, ClassTaxonomy, LabelCase, MAX_CLASS_ID};
use crate::config::ExportConfig;
use crate::error::{ExportError, ResourceError, ValidationError};
use crate::geometry::{Annotation, AnnotationId};
use crate::persistence::{ImageId, ImageMeta, Persistence, ProjectSnapshot, VisualFilter};
use archive::{ArchiveFile, ArchiveHandle, ArchiveSink};
use coco::CocoDataset;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One `classId cx cy w h` line per annotation.
    Yolo,
    /// One `classId x1 y1 ... xn yn` line per annotation.
    YoloSegmentation,
    /// Single `annotations.json` manifest.
    Coco,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::Yolo,
        ExportFormat::YoloSegmentation,
        ExportFormat::Coco,
    ];

    /// Selector accepted by [`FromStr`].
    pub fn key(&self) -> &'static str {
        match self {
            ExportFormat::Yolo => "yolo",
            ExportFormat::YoloSegmentation => "yolo-seg",
            ExportFormat::Coco => "coco",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Yolo => "YOLO detection",
            ExportFormat::YoloSegmentation => "YOLO segmentation",
            ExportFormat::Coco => "COCO JSON",
        }
    }

    /// Extension of the generated label file(s).
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Yolo | ExportFormat::YoloSegmentation => "txt",
            ExportFormat::Coco => "json",
        }
    }

    /// Whether images are split into train and val folders.
    pub fn is_partitioned(&self) -> bool {
        !matches!(self, ExportFormat::Coco)
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.key() == key)
            .ok_or_else(|| ExportError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-facing export options. Turned into an [`ExportRequest`] before any
/// work starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub format: String,
    pub train_fraction: f64,
    pub label_case: LabelCase,
    pub class_mapping: Option<ClassMapping>,
    pub bundle_images: bool,
    /// Filter kind passed to the visual filter for every bundled image.
    pub filter: Option<String>,
    pub coco_category_start_id: u32,
    pub segmentation_epsilon: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

impl ExportOptions {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            format: config.default_format.clone(),
            train_fraction: config.train_fraction,
            label_case: config.label_case,
            class_mapping: None,
            bundle_images: config.bundle_images,
            filter: config.filter.clone(),
            coco_category_start_id: config.coco_category_start_id,
            segmentation_epsilon: config.segmentation_epsilon,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_class_mapping(mut self, mapping: ClassMapping) -> Self {
        self.class_mapping = Some(mapping);
        self
    }
}

/// Fully validated export request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub train_fraction: f64,
    pub label_case: LabelCase,
    pub class_mapping: Option<ClassMapping>,
    pub bundle_images: bool,
    pub filter: Option<String>,
    pub coco_category_start_id: u32,
    pub segmentation_epsilon: f32,
}

impl TryFrom<ExportOptions> for ExportRequest {
    type Error = ExportError;

    fn try_from(options: ExportOptions) -> Result<Self, Self::Error> {
        let format: ExportFormat = options.format.parse()?;

        if !(0.0..=1.0).contains(&options.train_fraction) {
            return Err(ExportError::InvalidOptions(format!(
                "train fraction {} is outside [0, 1]",
                options.train_fraction
            )));
        }
        if !options.segmentation_epsilon.is_finite() || options.segmentation_epsilon < 0.0 {
            return Err(ExportError::InvalidOptions(format!(
                "segmentation epsilon {} must be a non-negative number",
                options.segmentation_epsilon
            )));
        }
        if options
            .class_mapping
            .as_ref()
            .is_some_and(|m| m.classes.is_empty())
        {
            return Err(ExportError::InvalidOptions(
                "class mapping has no classes".to_string(),
            ));
        }
        if let Some(max) = options
            .class_mapping
            .as_ref()
            .and_then(ClassMapping::max_id)
            .filter(|&id| id > MAX_CLASS_ID)
        {
            return Err(ExportError::InvalidOptions(format!(
                "class id {max} is above the limit of {MAX_CLASS_ID}"
            )));
        }
        let filter = options.filter.filter(|f| !f.trim().is_empty());

        Ok(Self {
            format,
            train_fraction: options.train_fraction,
            label_case: options.label_case,
            class_mapping: options.class_mapping,
            bundle_images: options.bundle_images,
            filter,
            coco_category_start_id: options.coco_category_start_id,
            segmentation_epsilon: options.segmentation_epsilon,
        })
    }
}

/// An annotation left out of the export.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub image_id: ImageId,
    pub annotation_id: AnnotationId,
    pub reason: ValidationError,
}

/// Export result with statistics
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub images_exported: usize,
    pub train_images: usize,
    pub val_images: usize,
    pub annotations_exported: usize,
    pub classes: usize,
    pub skipped: Vec<SkippedRecord>,
    pub handle: ArchiveHandle,
}

impl ExportSummary {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Files plus counters collected while encoding.
#[derive(Debug, Default)]
struct Encoded {
    files: Vec<ArchiveFile>,
    records: usize,
    skipped: Vec<SkippedRecord>,
}

impl Encoded {
    fn skip(&mut self, image_id: ImageId, ann: &Annotation, reason: ValidationError) {
        log::warn!(
            "Skipping annotation {} on image {}: {}",
            ann.id,
            image_id,
            reason
        );
        self.skipped.push(SkippedRecord {
            image_id,
            annotation_id: ann.id,
            reason,
        });
    }
}

/// Export a project with an unseeded train/val shuffle.
pub async fn run_export<P, S>(
    persistence: &P,
    project_id: &str,
    options: ExportOptions,
    filter: Option<&dyn VisualFilter>,
    sink: &mut S,
) -> Result<ExportSummary, ExportError>
where
    P: Persistence,
    S: ArchiveSink,
{
    let mut rng = rand::thread_rng();
    run_export_with(persistence, project_id, options, filter, sink, &mut rng).await
}

/// Export a project, drawing the train/val shuffle from `rng`.
///
/// Images are fetched one at a time. Any [`ResourceError`] aborts the export
/// before the sink is called.
pub async fn run_export_with<P, S, R>(
    persistence: &P,
    project_id: &str,
    options: ExportOptions,
    filter: Option<&dyn VisualFilter>,
    sink: &mut S,
    rng: &mut R,
) -> Result<ExportSummary, ExportError>
where
    P: Persistence,
    S: ArchiveSink,
    R: Rng + ?Sized,
{
    let request = ExportRequest::try_from(options)?;
    if request.bundle_images && request.filter.is_some() && filter.is_none() {
        return Err(ExportError::InvalidOptions(
            "a filter kind was requested but no visual filter is available".to_string(),
        ));
    }

    let snapshot = ProjectSnapshot::capture(persistence, project_id).await?;
    if snapshot.total_annotations() == 0 {
        return Err(ExportError::NoAnnotations);
    }
    for image in &snapshot.images {
        if image.width == 0 || image.height == 0 {
            return Err(ResourceError::corrupt(&image.filename, "image has zero width or height").into());
        }
    }
    log::info!(
        "Exporting project '{}' as {}: {} images, {} annotations",
        project_id,
        request.format,
        snapshot.images.len(),
        snapshot.total_annotations()
    );

    let taxonomy = ClassTaxonomy::resolve(
        snapshot.labels(),
        request.label_case,
        request.class_mapping.as_ref(),
    );
    let bundler = ImageBundler {
        persistence,
        filter: if request.bundle_images {
            filter.zip(request.filter.as_deref())
        } else {
            None
        },
    };

    let (encoded, train_images, val_images) = if request.format.is_partitioned() {
        let split = partition::partition_with(
            snapshot.images.iter().collect::<Vec<_>>(),
            request.train_fraction,
            rng,
        );
        log::info!("Partition: {} train, {} val", split.train.len(), split.val.len());
        let mut encoded = Encoded::default();
        for (dir, images) in [("train", &split.train), ("val", &split.val)] {
            for image in images {
                encode_label_file(&request, &taxonomy, &snapshot, image, dir, &mut encoded);
                if request.bundle_images {
                    let bytes = bundler.fetch(image).await?;
                    encoded
                        .files
                        .push(ArchiveFile::new(format!("images/{dir}/{}", image.basename()), bytes));
                }
            }
        }
        let names = taxonomy.names_by_id();
        encoded
            .files
            .push(ArchiveFile::new("classes.txt", yolo::classes_file(&names)));
        encoded
            .files
            .push(ArchiveFile::new("data.yaml", yolo::data_yaml(&names)?));
        (encoded, split.train.len(), split.val.len())
    } else {
        let mut encoded = Encoded::default();
        let dataset = encode_coco(&request, &taxonomy, &snapshot, &mut encoded);
        encoded
            .files
            .push(ArchiveFile::new("annotations.json", dataset.to_json()?));
        if request.bundle_images {
            for image in &snapshot.images {
                let bytes = bundler.fetch(image).await?;
                encoded
                    .files
                    .push(ArchiveFile::new(format!("images/{}", image.basename()), bytes));
            }
        }
        (encoded, snapshot.images.len(), 0)
    };

    let handle = sink.package_and_deliver(encoded.files).await?;
    let summary = ExportSummary {
        format: request.format,
        images_exported: snapshot.images.len(),
        train_images,
        val_images,
        annotations_exported: encoded.records,
        classes: taxonomy.len(),
        skipped: encoded.skipped,
        handle,
    };
    log::info!(
        "Export finished: {} records, {} skipped",
        summary.annotations_exported,
        summary.skipped_count()
    );
    Ok(summary)
}

/// Fetches image bytes, passing them through the visual filter when one is set.
struct ImageBundler<'a, P> {
    persistence: &'a P,
    filter: Option<(&'a dyn VisualFilter, &'a str)>,
}

impl<P: Persistence> ImageBundler<'_, P> {
    async fn fetch(&self, image: &ImageMeta) -> Result<Vec<u8>, ResourceError> {
        let bytes = self.persistence.load_image_bytes(image.id).await?;
        match self.filter {
            Some((filter, kind)) => filter.apply_filter(&bytes, kind),
            None => Ok(bytes),
        }
    }
}

fn encode_record(
    request: &ExportRequest,
    taxonomy: &ClassTaxonomy,
    image: &ImageMeta,
    ann: &Annotation,
) -> Result<String, ValidationError> {
    let class_id = taxonomy.class_id(&ann.label)?;
    match request.format {
        ExportFormat::YoloSegmentation => segmentation::encode_polygon(
            ann.vertices(),
            image,
            class_id,
            request.segmentation_epsilon,
        ),
        _ => {
            ann.validate()?;
            yolo::encode_bbox(&ann.bounding_box(), image, class_id)
        }
    }
}

fn encode_label_file(
    request: &ExportRequest,
    taxonomy: &ClassTaxonomy,
    snapshot: &ProjectSnapshot,
    image: &ImageMeta,
    dir: &str,
    encoded: &mut Encoded,
) {
    let mut records = Vec::new();
    for ann in snapshot.annotations_for(image.id) {
        match encode_record(request, taxonomy, image, ann) {
            Ok(line) => records.push(line),
            Err(reason) => encoded.skip(image.id, ann, reason),
        }
    }
    encoded.records += records.len();
    let path = format!("labels/{dir}/{}", image.with_extension(request.format.extension()));
    encoded
        .files
        .push(ArchiveFile::new(path, yolo::label_file(&records)));
}

fn encode_coco(
    request: &ExportRequest,
    taxonomy: &ClassTaxonomy,
    snapshot: &ProjectSnapshot,
    encoded: &mut Encoded,
) -> CocoDataset {
    let mut dataset = CocoDataset::new();
    for (id, name) in taxonomy.entries() {
        dataset.add_category(id + request.coco_category_start_id, name.clone());
    }
    for (index, image) in snapshot.images.iter().enumerate() {
        let coco_id = index as u64 + 1;
        dataset.add_image(coco_id, image);
        for ann in snapshot.annotations_for(image.id) {
            let result = taxonomy.class_id(&ann.label).and_then(|class_id| {
                dataset.add_annotation(coco_id, class_id + request.coco_category_start_id, ann)
            });
            match result {
                Ok(()) => encoded.records += 1,
                Err(reason) => encoded.skip(image.id, ann, reason),
            }
        }
    }
    dataset
}
