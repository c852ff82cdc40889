// P3-030: Add annotations by drawing
// Test: Drag out rectangles and click out polygons
// Expected: Valid shapes are committed with fresh ids; degenerate ones are dropped


use annotator_core::geometry::{BoundingBox, Color, Point, ShapeKind};
use annotator_core::state::{DrawState, Editor};
use test_helpers::*;

#[test]
fn drag_commits_rectangle() {
    let mut editor = Editor::new(create_basic_scene());
    editor.current_label = "car".into();
    editor.current_color = Color::rgb(0, 255, 0);

    editor.begin_rectangle(Point::new(400.0, 400.0));
    editor.update_rectangle(Point::new(350.0, 380.0));
    assert_eq!(editor.rectangle_preview(), Some(BoundingBox::new(350.0, 380.0, 50.0, 20.0)));
    let id = editor.finish_rectangle(Point::new(300.0, 300.0)).unwrap();

    assert_eq!(id, 3);
    let ann = editor.annotation(id).unwrap();
    assert_eq!(ann.kind(), ShapeKind::Rectangle);
    assert_eq!(ann.bounding_box(), BoundingBox::new(300.0, 300.0, 100.0, 100.0));
    assert_eq!(ann.label, "car");
    assert_eq!(ann.color.to_hex(), "#00ff00");
    assert_eq!(editor.draw_state(), &DrawState::Idle);
}

#[test]
fn zero_width_drag_is_discarded() {
    let mut editor = Editor::default();
    editor.begin_rectangle(Point::new(10.0, 10.0));
    assert_eq!(editor.finish_rectangle(Point::new(10.0, 90.0)), None);
    assert!(editor.annotations().is_empty());
    assert_eq!(editor.draw_state(), &DrawState::Idle);
}

#[test]
fn polygon_needs_three_points() {
    let mut editor = Editor::default();
    editor.add_polygon_point(Point::new(0.0, 0.0));
    editor.add_polygon_point(Point::new(50.0, 0.0));

    assert_eq!(editor.finish_polygon(), None);
    // Points survive the rejected close
    assert_eq!(editor.draw_state().polygon_points().len(), 2);

    editor.add_polygon_point(Point::new(25.0, 40.0));
    let id = editor.finish_polygon().unwrap();
    let ann = editor.annotation(id).unwrap();
    assert_eq!(ann.kind(), ShapeKind::Polygon);
    assert_eq!(ann.bounding_box(), BoundingBox::new(0.0, 0.0, 50.0, 40.0));
    assert_eq!(editor.draw_state(), &DrawState::Idle);
}

#[test]
fn repeated_points_do_not_count() {
    let mut editor = Editor::default();
    for _ in 0..3 {
        editor.add_polygon_point(Point::new(5.0, 5.0));
    }
    editor.add_polygon_point(Point::new(9.0, 5.0));
    assert_eq!(editor.finish_polygon(), None);
    assert_eq!(editor.draw_state().polygon_points().len(), 4);
}

#[test]
fn finishing_rectangle_leaves_polygon_in_progress_alone() {
    let mut editor = Editor::default();
    editor.add_polygon_point(Point::new(0.0, 0.0));
    assert_eq!(editor.finish_rectangle(Point::new(10.0, 10.0)), None);
    assert_eq!(editor.draw_state().polygon_points().len(), 1);
}

#[test]
fn undo_and_redo_a_commit() {
    let mut editor = Editor::default();
    editor.begin_rectangle(Point::new(0.0, 0.0));
    editor.finish_rectangle(Point::new(10.0, 10.0)).unwrap();
    assert!(editor.undo());
    assert!(editor.annotations().is_empty());
    assert!(editor.redo());
    assert_eq!(editor.annotations().len(), 1);
    assert!(!editor.redo());
}
