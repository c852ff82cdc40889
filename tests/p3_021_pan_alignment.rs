// P3-021: Annotation alignment while panning
// Test: Pan the view and click the same image location
// Expected: Hits and new shapes stay anchored in image space


use annotator_core::geometry::{BoundingBox, Point};
use annotator_core::state::{Editor, SelectMode};
use test_helpers::*;

#[test]
fn pan_shifts_view_not_geometry() {
    let mut editor = Editor::new(vec![create_bbox(1, 100.0, 100.0, 50.0, 50.0)]);
    editor.view.pan_by(200.0, -40.0);

    // Old screen location is now empty
    assert_eq!(editor.annotation_at(Point::new(120.0, 120.0)), None);
    // Same image point, shifted by the pan
    assert_eq!(editor.select_at(Point::new(320.0, 80.0), SelectMode::Replace), Some(1));
    assert_eq!(editor.annotation(1).unwrap().bounding_box(), BoundingBox::new(100.0, 100.0, 50.0, 50.0));
}

#[test]
fn rectangle_drawn_while_panned_is_stored_in_image_space() {
    let mut editor = Editor::default();
    editor.view.pan_by(30.0, 10.0);

    editor.begin_rectangle(Point::new(130.0, 110.0));
    editor.update_rectangle(Point::new(180.0, 150.0));
    let id = editor.finish_rectangle(Point::new(190.0, 170.0)).unwrap();

    let bbox = editor.annotation(id).unwrap().bounding_box();
    assert_eq!(bbox, BoundingBox::new(100.0, 100.0, 60.0, 60.0));
}

#[test]
fn view_round_trip() {
    let mut editor = Editor::default();
    editor.view.pan_by(-13.5, 27.25);
    let p = Point::new(42.0, 17.0);
    let back = editor.view.to_image(editor.view.to_view(p));
    assert_close(back.x, p.x);
    assert_close(back.y, p.y);
}
