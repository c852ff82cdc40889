// P4-080: Filesystem dataset store and session navigation
// Test: Build a manifest from a folder of images, edit, navigate, reload, export
// Expected: Edits are flushed on every image switch and survive a reload


use annotator_core::config::ViewConfig;
use annotator_core::error::ResourceError;
use annotator_core::export::archive::MemoryArchive;
use annotator_core::export::{ExportOptions, run_export};
use annotator_core::geometry::{BoundingBox, Color, Point, ShapeKind};
use annotator_core::persistence::Persistence;
use annotator_core::state::{
    AnnotationSession, DatasetStore, create_dataset_from_folder, project_id_for, state_path_for,
};
use std::path::Path;
use test_helpers::*;

fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::new(width, height).save(path).unwrap();
}

fn image_folder() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_png(&dir.path().join("b_second.png"), 30, 20);
    write_png(&dir.path().join("a_first.png"), 64, 48);
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
    dir
}

#[tokio::test]
async fn manifest_from_folder_lists_sorted_images() {
    let dir = image_folder();
    let manifest = create_dataset_from_folder(dir.path()).unwrap();
    let store = DatasetStore::open(&manifest).await.unwrap();

    assert_eq!(store.entries.len(), 2);
    assert_eq!(store.project_id, project_id_for(&manifest));

    let images = store.list_project_images(&store.project_id).await.unwrap();
    assert_eq!(images[0].filename, "a_first.png");
    assert_eq!((images[0].width, images[0].height), (64, 48));
    assert_eq!(images[1].id, 2);
    assert_eq!((images[1].width, images[1].height), (30, 20));
}

#[test]
fn empty_folder_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        create_dataset_from_folder(dir.path()),
        Err(ResourceError::Unavailable(_))
    ));
}

#[tokio::test]
async fn annotations_round_trip_through_state_files() {
    let dir = image_folder();
    let store = DatasetStore::open(&create_dataset_from_folder(dir.path()).unwrap())
        .await
        .unwrap();

    assert!(store.load_annotations(1).await.unwrap().is_empty());

    let saved = vec![
        create_labeled_bbox(1, 1.0, 2.0, 10.0, 12.0, "car").with_color(Color::rgb(0, 0, 255)),
        create_polygon(2, &[(0.0, 0.0), (20.0, 0.0), (10.0, 15.0)], "sign").with_locked(true),
    ];
    store.save_annotations(1, &saved).await.unwrap();
    assert!(state_path_for(store.entry(1).unwrap()).ends_with("a_first.state.json"));

    let loaded = store.load_annotations(1).await.unwrap();
    assert_eq!(loaded, saved);
    assert!(matches!(
        store.load_annotations(3).await,
        Err(ResourceError::ImageNotFound(3))
    ));
}

#[tokio::test]
async fn broken_records_are_dropped_and_bad_json_is_corrupt() {
    let dir = image_folder();
    let store = DatasetStore::open(&create_dataset_from_folder(dir.path()).unwrap())
        .await
        .unwrap();
    let state = state_path_for(store.entry(1).unwrap());

    std::fs::write(
        &state,
        r##"[
            {"id": 1, "type": "polygon", "vertices": [{"x": 0, "y": 0}, {"x": 5, "y": 5}], "label": "bad"},
            {"id": 2, "type": "rectangle", "vertices": [{"x": 0, "y": 0}, {"x": 4, "y": 0}, {"x": 4, "y": 3}, {"x": 0, "y": 3}], "label": "ok", "color": "#00ff00"}
        ]"##,
    )
    .unwrap();
    let loaded = store.load_annotations(1).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].kind(), ShapeKind::Rectangle);
    assert_eq!(loaded[0].bounding_box(), BoundingBox::new(0.0, 0.0, 4.0, 3.0));

    std::fs::write(&state, "{ not json").unwrap();
    assert!(matches!(
        store.load_annotations(1).await,
        Err(ResourceError::Corrupt { .. })
    ));
}

#[tokio::test]
async fn session_flushes_before_switching_images() {
    let dir = image_folder();
    let manifest = create_dataset_from_folder(dir.path()).unwrap();
    let store = DatasetStore::open(&manifest).await.unwrap();
    let project = store.project_id.clone();

    let mut session = AnnotationSession::open(store, &project, ViewConfig::default())
        .await
        .unwrap();
    assert_eq!(session.current_index(), 0);

    let editor = session.editor_mut();
    editor.current_label = "cat".into();
    editor.begin_rectangle(Point::new(5.0, 5.0));
    editor.finish_rectangle(Point::new(25.0, 30.0)).unwrap();

    assert_eq!(session.next().await.unwrap(), 1);
    assert!(session.editor().annotations().is_empty());
    // Clamped at the end
    assert_eq!(session.next().await.unwrap(), 1);
    assert_eq!(session.first().await.unwrap(), 0);
    assert_eq!(session.editor().annotations().len(), 1);
    assert_eq!(session.editor().annotations()[0].label, "cat");
    session.close().await.unwrap();

    // A fresh store sees the edit and can export it
    let reopened = DatasetStore::open(&manifest).await.unwrap();
    assert_eq!(reopened.load_annotations(1).await.unwrap().len(), 1);

    let mut sink = MemoryArchive::new();
    let summary = run_export(&reopened, &project, ExportOptions::default(), None, &mut sink)
        .await
        .unwrap();
    assert_eq!(summary.annotations_exported, 1);
    assert_eq!(summary.images_exported, 2);
}

#[tokio::test]
async fn session_counts_saves() {
    let persistence = MemoryPersistence::new("mem")
        .with_image(image_meta(1, 10, 10, "a.png"), vec![create_bbox(1, 0.0, 0.0, 5.0, 5.0)])
        .with_image(image_meta(2, 10, 10, "b.png"), Vec::new())
        .with_image(image_meta(3, 10, 10, "c.png"), Vec::new());
    let mut session = AnnotationSession::open(persistence, "mem", ViewConfig::default())
        .await
        .unwrap();

    session.last().await.unwrap();
    session.prev().await.unwrap();
    session.goto(99).await.unwrap();
    assert_eq!(session.current_index(), 2);

    let persistence = session.close().await.unwrap();
    assert_eq!(persistence.saves.get(), 4);
    assert_eq!(persistence.stored(1).len(), 1);
}
