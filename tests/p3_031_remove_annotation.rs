// P3-031: Remove annotations
// Test: Delete by id, under the cursor, and the whole selection
// Expected: Removed shapes are gone and stale focus/selection is cleared


use annotator_core::geometry::Point;
use annotator_core::state::{Editor, SelectMode};
use test_helpers::*;

#[test]
fn deleting_focused_clears_focus() {
    let mut editor = Editor::new(create_basic_scene());
    editor.select_at(Point::new(150.0, 150.0), SelectMode::Replace);

    assert!(editor.delete(1));
    assert_eq!(editor.annotations().len(), 1);
    assert_eq!(editor.focused_id(), None);
    assert!(editor.selected_ids().is_empty());
}

#[test]
fn deleting_unknown_id_is_a_no_op() {
    let mut editor = Editor::new(create_basic_scene());
    assert!(!editor.delete(99));
    assert_eq!(editor.annotations().len(), 2);
}

#[test]
fn delete_at_removes_topmost_only() {
    let mut editor = Editor::new(create_overlapping_boxes_scene());
    assert!(editor.delete_at(Point::new(200.0, 200.0)));
    assert_eq!(editor.annotations().len(), 1);
    assert_eq!(editor.annotations()[0].id, 1);
    assert!(!editor.delete_at(Point::new(5.0, 5.0)));
}

#[test]
fn delete_during_drag_ends_the_drag() {
    let mut editor = Editor::new(create_basic_scene());
    editor.select_at(Point::new(150.0, 150.0), SelectMode::Replace);
    editor.begin_drag(Point::new(100.0, 100.0)).unwrap();

    editor.delete(1);
    assert!(editor.drag_state().is_none());
    assert!(!editor.drag_to(Point::new(0.0, 0.0)));
}

#[test]
fn undo_restores_deleted_selection() {
    let mut editor = Editor::new(create_basic_scene());
    editor.select_all();
    assert_eq!(editor.delete_selected(), 2);
    assert!(editor.annotations().is_empty());

    assert!(editor.undo());
    assert_eq!(editor.annotations().len(), 2);
    // Selection is not restored
    assert!(editor.selected_ids().is_empty());
}

#[test]
fn new_ids_do_not_reuse_deleted_ones() {
    let mut editor = Editor::new(create_basic_scene());
    editor.delete(2);
    editor.begin_rectangle(Point::new(0.0, 0.0));
    let id = editor.finish_rectangle(Point::new(10.0, 10.0)).unwrap();
    assert_eq!(id, 3);
}
