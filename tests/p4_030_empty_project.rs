// P4-030: Exporting a project with nothing to export
// Test: Images exist but no annotations; also bad selectors and options
// Expected: The export is refused and the sink is never called


use annotator_core::error::{ExportError, ResourceError};
use annotator_core::export::archive::MemoryArchive;
use annotator_core::export::{ExportFormat, ExportOptions, ExportRequest, run_export};
use test_helpers::*;

#[tokio::test]
async fn zero_annotations_aborts_before_packaging() {
    let persistence = MemoryPersistence::new("empty")
        .with_image(image_meta(1, 640, 480, "a.jpg"), Vec::new())
        .with_image(image_meta(2, 640, 480, "b.jpg"), Vec::new());
    let mut sink = MemoryArchive::new();

    let err = run_export(&persistence, "empty", ExportOptions::default(), None, &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(err, ExportError::NoAnnotations));
    assert!(sink.is_empty());
    assert_eq!(persistence.byte_fetches.get(), 0);
}

#[tokio::test]
async fn unsupported_format_is_rejected_before_any_io() {
    let persistence = MemoryPersistence::new("p")
        .with_image(image_meta(1, 10, 10, "a.jpg"), vec![create_bbox(1, 0.0, 0.0, 5.0, 5.0)]);
    let mut sink = MemoryArchive::new();

    let err = run_export(
        &persistence,
        "p",
        ExportOptions::default().with_format("pascal-voc"),
        None,
        &mut sink,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ExportError::UnsupportedFormat(ref f) if f == "pascal-voc"));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn unknown_project_is_a_resource_error() {
    let persistence = MemoryPersistence::new("p")
        .with_image(image_meta(1, 10, 10, "a.jpg"), vec![create_bbox(1, 0.0, 0.0, 5.0, 5.0)]);
    let mut sink = MemoryArchive::new();

    let err = run_export(&persistence, "other", ExportOptions::default(), None, &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExportError::Resource(ResourceError::ProjectNotFound(_))
    ));
}

#[tokio::test]
async fn missing_image_bytes_abort_without_archive() {
    let persistence = MemoryPersistence::new("p")
        .with_image(image_meta(1, 10, 10, "a.jpg"), vec![create_bbox(1, 0.0, 0.0, 5.0, 5.0)])
        .with_image(image_meta(2, 10, 10, "b.jpg"), vec![create_bbox(1, 0.0, 0.0, 5.0, 5.0)])
        .without_bytes(2);
    let mut sink = MemoryArchive::new();

    let err = run_export(
        &persistence,
        "p",
        ExportOptions::default().with_format("coco"),
        None,
        &mut sink,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ExportError::Resource(ResourceError::ImageNotFound(2))
    ));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn filter_kind_without_filter_is_invalid() {
    let persistence = MemoryPersistence::new("p")
        .with_image(image_meta(1, 10, 10, "a.jpg"), vec![create_bbox(1, 0.0, 0.0, 5.0, 5.0)]);
    let mut sink = MemoryArchive::new();
    let options = ExportOptions {
        filter: Some("fog".into()),
        ..ExportOptions::default()
    };

    let err = run_export(&persistence, "p", options, None, &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidOptions(_)));
}

#[test]
fn request_validation() {
    let ok = ExportRequest::try_from(ExportOptions::default().with_format(" YOLO-SEG ")).unwrap();
    assert_eq!(ok.format, ExportFormat::YoloSegmentation);

    for fraction in [-0.1, 1.5, f64::NAN] {
        let options = ExportOptions {
            train_fraction: fraction,
            ..ExportOptions::default()
        };
        assert!(matches!(
            ExportRequest::try_from(options),
            Err(ExportError::InvalidOptions(_))
        ));
    }

    let empty_mapping = ExportOptions::default().with_class_mapping(Default::default());
    assert!(ExportRequest::try_from(empty_mapping).is_err());
}
