// P4-010: Bounding-box detection export
// Test: One 800x600 image with a car at (100,100,200,150)
// Expected: `0 0.250000 0.291667 0.250000 0.250000` in labels/train/street.txt


use annotator_core::export::archive::{ArchiveHandle, MemoryArchive};
use annotator_core::export::{ExportFormat, ExportOptions, run_export_with, yolo};
use annotator_core::geometry::BoundingBox;
use annotator_core::persistence::VisualFilter;
use rand::SeedableRng;
use rand::rngs::StdRng;
use test_helpers::*;

fn all_train() -> ExportOptions {
    ExportOptions {
        train_fraction: 1.0,
        ..ExportOptions::default()
    }
    .with_format("yolo")
}

#[tokio::test]
async fn single_car_row() {
    let persistence = MemoryPersistence::new("streets").with_image(
        image_meta(1, 800, 600, "street.jpg"),
        vec![create_labeled_bbox(1, 100.0, 100.0, 200.0, 150.0, "car")],
    );
    let mut sink = MemoryArchive::new();
    let mut rng = StdRng::seed_from_u64(1);

    let summary = run_export_with(&persistence, "streets", all_train(), None, &mut sink, &mut rng)
        .await
        .unwrap();

    assert_eq!(summary.format, ExportFormat::Yolo);
    assert_eq!(summary.annotations_exported, 1);
    assert_eq!(summary.train_images, 1);
    assert_eq!(summary.handle, ArchiveHandle::Memory { files: 4 });
    assert_eq!(
        sink.get_str("labels/train/street.txt"),
        Some("0 0.250000 0.291667 0.250000 0.250000\n")
    );
    assert_eq!(sink.get_str("classes.txt"), Some("car\n"));
    assert_eq!(sink.get("images/train/street.jpg"), Some(&b"street.jpg"[..]));
    assert!(sink.get_str("data.yaml").unwrap().contains("nc: 1"));
}

#[tokio::test]
async fn every_image_gets_a_label_file() {
    let persistence = MemoryPersistence::new("p")
        .with_image(image_meta(1, 100, 100, "a.png"), vec![create_bbox(1, 0.0, 0.0, 10.0, 10.0)])
        .with_image(image_meta(2, 100, 100, "b.png"), Vec::new());
    let mut sink = MemoryArchive::new();
    let mut rng = StdRng::seed_from_u64(3);

    run_export_with(&persistence, "p", all_train(), None, &mut sink, &mut rng)
        .await
        .unwrap();

    assert_eq!(sink.get_str("labels/train/b.txt"), Some(""));
}

#[tokio::test]
async fn images_are_fetched_once_each_and_can_be_skipped() {
    let scene = || {
        MemoryPersistence::new("p")
            .with_image(image_meta(1, 100, 100, "a.png"), vec![create_bbox(1, 0.0, 0.0, 10.0, 10.0)])
            .with_image(image_meta(2, 100, 100, "b.png"), vec![create_bbox(1, 5.0, 5.0, 10.0, 10.0)])
    };
    let mut rng = StdRng::seed_from_u64(3);

    let persistence = scene();
    let mut sink = MemoryArchive::new();
    run_export_with(&persistence, "p", all_train(), None, &mut sink, &mut rng)
        .await
        .unwrap();
    assert_eq!(persistence.byte_fetches.get(), 2);

    let persistence = scene();
    let mut sink = MemoryArchive::new();
    let options = ExportOptions {
        bundle_images: false,
        ..all_train()
    };
    run_export_with(&persistence, "p", options, None, &mut sink, &mut rng)
        .await
        .unwrap();
    assert_eq!(persistence.byte_fetches.get(), 0);
    assert!(sink.paths().all(|p| !p.starts_with("images/")));
}

#[tokio::test]
async fn filter_runs_on_bundled_images() {
    let persistence = MemoryPersistence::new("p")
        .with_image(image_meta(1, 100, 100, "a.png"), vec![create_bbox(1, 0.0, 0.0, 10.0, 10.0)]);
    let filter = CountingFilter::default();
    let mut sink = MemoryArchive::new();
    let mut rng = StdRng::seed_from_u64(3);
    let options = ExportOptions {
        filter: Some("fog".into()),
        ..all_train()
    };

    run_export_with(&persistence, "p", options, Some(&filter as &dyn VisualFilter), &mut sink, &mut rng)
        .await
        .unwrap();

    assert_eq!(filter.calls.get(), 1);
    assert_eq!(sink.get("images/train/a.png"), Some(&b"fog:a.png"[..]));
}

#[test]
fn denormalized_values_reconstruct_the_box() {
    let image = image_meta(1, 1280, 720, "x.jpg");
    let bbox = BoundingBox::new(333.3, 71.9, 120.7, 404.2);
    let line = yolo::encode_bbox(&bbox, &image, 4).unwrap();
    let v: Vec<f32> = line.split(' ').skip(1).map(|s| s.parse().unwrap()).collect();

    let (w, h) = (v[2] * 1280.0, v[3] * 720.0);
    let (x, y) = (v[0] * 1280.0 - w / 2.0, v[1] * 720.0 - h / 2.0);
    for (got, want) in [(x, bbox.x), (y, bbox.y), (w, bbox.width), (h, bbox.height)] {
        assert!((got - want).abs() < 0.01, "{got} vs {want}");
    }
}
