//! Interactive editing of one image's annotation list.
//!
//! All pointer coordinates passed in are view space. Nothing here returns an
//! error: invalid strokes are dropped and the caller gets `None`/`false`.

use super::types::{DragState, DrawState, SelectMode, UndoHistory};
use crate::config::ViewConfig;
use crate::geometry::{Annotation, AnnotationId, BoundingBox, Color, Point};
use crate::handles::{self, DEFAULT_HANDLE_TOLERANCE, Handle, Resizable};
use crate::view::ViewTransform;

#[derive(Debug, Clone)]
pub struct Editor {
    annotations: Vec<Annotation>,
    pub view: ViewTransform,
    pub handle_tolerance: f32,
    /// Label and colour given to newly committed shapes.
    pub current_label: String,
    pub current_color: Color,
    focused: Option<AnnotationId>,
    selected: Vec<AnnotationId>,
    draw: DrawState,
    drag: Option<DragState>,
    history: UndoHistory,
    next_id: AnnotationId,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Editor {
    pub fn new(annotations: Vec<Annotation>) -> Self {
        let next_id = next_id_from_annotations(&annotations);
        Self {
            annotations,
            view: ViewTransform::default(),
            handle_tolerance: DEFAULT_HANDLE_TOLERANCE,
            current_label: "object".to_string(),
            current_color: Color::default(),
            focused: None,
            selected: Vec::new(),
            draw: DrawState::Idle,
            drag: None,
            history: UndoHistory::default(),
            next_id,
        }
    }

    pub fn with_view_config(mut self, config: &ViewConfig) -> Self {
        self.handle_tolerance = config.handle_tolerance_px;
        self
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Owned copy of the current list, e.g. for saving.
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    /// Swap in the list for another image. Focus, selection, in-flight shapes
    /// and undo history all belong to the old list and are dropped.
    pub fn replace_annotations(&mut self, annotations: Vec<Annotation>) {
        self.next_id = self.next_id.max(next_id_from_annotations(&annotations));
        self.annotations = annotations;
        self.focused = None;
        self.selected.clear();
        self.draw = DrawState::Idle;
        self.drag = None;
        self.history.clear();
    }

    pub fn draw_state(&self) -> &DrawState {
        &self.draw
    }

    pub fn drag_state(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn focused(&self) -> Option<&Annotation> {
        self.focused.and_then(|id| self.annotation(id))
    }

    pub fn focused_id(&self) -> Option<AnnotationId> {
        self.focused
    }

    pub fn selected_ids(&self) -> &[AnnotationId] {
        &self.selected
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Topmost annotation under a view-space point. Later entries are drawn
    /// on top, so the list is scanned from the back.
    pub fn annotation_at(&self, pointer: Point) -> Option<AnnotationId> {
        let p = self.view.to_image(pointer);
        self.annotations
            .iter()
            .rev()
            .find(|a| a.contains_point(p))
            .map(|a| a.id)
    }

    /// Click-to-select. A click on empty canvas clears the selection in
    /// `Replace` mode.
    pub fn select_at(&mut self, pointer: Point, mode: SelectMode) -> Option<AnnotationId> {
        let hit = self.annotation_at(pointer);
        match (hit, mode) {
            (Some(id), SelectMode::Replace) => {
                self.selected = vec![id];
                self.focused = Some(id);
            }
            (Some(id), SelectMode::Toggle) => {
                if let Some(pos) = self.selected.iter().position(|s| *s == id) {
                    self.selected.remove(pos);
                    if self.focused == Some(id) {
                        self.focused = self.selected.last().copied();
                    }
                } else {
                    self.selected.push(id);
                    self.focused = Some(id);
                }
            }
            (None, SelectMode::Replace) => self.deselect_all(),
            (None, SelectMode::Toggle) => {}
        }
        hit
    }

    pub fn select_all(&mut self) {
        self.selected = self.annotations.iter().map(|a| a.id).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
        self.focused = None;
    }

    /// Relabel every selected annotation. Returns how many changed.
    pub fn classify_selected(&mut self, label: &str) -> usize {
        let targets: Vec<AnnotationId> = self.selected.clone();
        if targets.is_empty() {
            return 0;
        }
        self.history.push(self.annotations.clone());
        let mut updated = 0;
        for ann in self.annotations.iter_mut().filter(|a| targets.contains(&a.id)) {
            ann.label = label.to_string();
            updated += 1;
        }
        log::debug!("Reclassified {} annotation(s) as '{}'", updated, label);
        updated
    }

    // ------------------------------------------------------------------
    // Rectangle drawing
    // ------------------------------------------------------------------

    pub fn begin_rectangle(&mut self, pointer: Point) {
        let p = self.view.to_image(pointer);
        self.deselect_all();
        self.draw = DrawState::Rectangle {
            start: p,
            current: p,
        };
    }

    pub fn update_rectangle(&mut self, pointer: Point) {
        let p = self.view.to_image(pointer);
        if let DrawState::Rectangle { current, .. } = &mut self.draw {
            *current = p;
        }
    }

    /// Preview bounds of the rectangle being dragged.
    pub fn rectangle_preview(&self) -> Option<BoundingBox> {
        match self.draw {
            DrawState::Rectangle { start, current } => Some(BoundingBox::from_corners(start, current)),
            _ => None,
        }
    }

    /// Commit on pointer release. A zero-area drag is discarded.
    pub fn finish_rectangle(&mut self, pointer: Point) -> Option<AnnotationId> {
        let end = self.view.to_image(pointer);
        let DrawState::Rectangle { start, .. } = self.draw else {
            return None;
        };
        self.draw = DrawState::Idle;
        let bbox = BoundingBox::from_corners(start, end);
        let ann = Annotation::rectangle(self.next_id, bbox, self.current_label.clone())
            .with_color(self.current_color);
        if let Err(reason) = ann.validate() {
            log::debug!("Rectangle discarded: {reason}");
            return None;
        }
        Some(self.commit(ann))
    }

    pub fn cancel_drawing(&mut self) {
        self.draw = DrawState::Idle;
    }

    // ------------------------------------------------------------------
    // Polygon drawing
    // ------------------------------------------------------------------

    pub fn add_polygon_point(&mut self, pointer: Point) {
        let p = self.view.to_image(pointer);
        match &mut self.draw {
            DrawState::Polygon { points } => points.push(p),
            other => {
                *other = DrawState::Polygon { points: vec![p] };
            }
        }
        log::debug!(
            "Vertex added at ({:.1}, {:.1}), total: {}",
            p.x,
            p.y,
            self.draw.polygon_points().len()
        );
    }

    /// Close the polygon. With fewer than three distinct points nothing is
    /// committed and the clicked points stay in place for more editing.
    pub fn finish_polygon(&mut self) -> Option<AnnotationId> {
        let points = self.draw.polygon_points().to_vec();
        let ann = Annotation::polygon(self.next_id, points, self.current_label.clone())?
            .with_color(self.current_color);
        if let Err(reason) = ann.validate() {
            log::debug!("Polygon not closed: {reason}");
            return None;
        }
        self.draw = DrawState::Idle;
        Some(self.commit(ann))
    }

    pub fn cancel_polygon(&mut self) {
        if matches!(self.draw, DrawState::Polygon { .. }) {
            self.draw = DrawState::Idle;
        }
    }

    fn commit(&mut self, ann: Annotation) -> AnnotationId {
        self.history.push(self.annotations.clone());
        let id = ann.id;
        log::debug!(
            "Committed {:?} {} with {} vertices",
            ann.kind(),
            id,
            ann.vertices().len()
        );
        self.annotations.push(ann);
        self.next_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Handle drags
    // ------------------------------------------------------------------

    /// Handle of the focused annotation under the pointer.
    pub fn handle_at(&self, pointer: Point) -> Option<Handle> {
        let ann = self.focused()?;
        handles::hit_test(ann, &self.view, pointer, self.handle_tolerance)
    }

    /// Start dragging the handle under the pointer, if any.
    pub fn begin_drag(&mut self, pointer: Point) -> Option<Handle> {
        let handle = self.handle_at(pointer)?;
        let ann = self.focused()?;
        let state = DragState {
            annotation_id: ann.id,
            handle,
            original_bbox: ann.bounding_box(),
            undo_snapshot: Some(self.annotations.clone()),
        };
        log::debug!(
            "Start resize: id={}, handle={:?}, bounds=({:.1}, {:.1}, {:.1}, {:.1})",
            state.annotation_id,
            handle,
            state.original_bbox.x,
            state.original_bbox.y,
            state.original_bbox.width,
            state.original_bbox.height
        );
        self.drag = Some(state);
        Some(handle)
    }

    pub fn drag_to(&mut self, pointer: Point) -> bool {
        let Some(drag) = &mut self.drag else {
            return false;
        };
        let (id, handle) = (drag.annotation_id, drag.handle);
        let p = self.view.to_image(pointer);
        let Some(ann) = self.annotations.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        let mut moved = ann.clone();
        if !moved.resize(handle, p) {
            return false;
        }
        // A move that lands on the same vertices keeps the shape (and its kind) as is.
        if moved.vertices() != ann.vertices() {
            if let Some(snapshot) = drag.undo_snapshot.take() {
                self.history.push(snapshot);
            }
            *ann = moved;
        }
        true
    }

    pub fn finish_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if let Some(ann) = self.annotation(drag.annotation_id) {
            let b = ann.bounding_box();
            log::debug!(
                "Resize finished: id={}, bounds=({:.1}, {:.1}, {:.1}, {:.1})",
                drag.annotation_id,
                b.x,
                b.y,
                b.width,
                b.height
            );
        }
        true
    }

    // ------------------------------------------------------------------
    // Deletion and history
    // ------------------------------------------------------------------

    pub fn delete(&mut self, id: AnnotationId) -> bool {
        let Some(index) = self.annotations.iter().position(|a| a.id == id) else {
            return false;
        };
        self.history.push(self.annotations.clone());
        self.annotations.remove(index);
        self.forget(id);
        true
    }

    /// Delete the topmost annotation under the pointer.
    pub fn delete_at(&mut self, pointer: Point) -> bool {
        self.annotation_at(pointer).is_some_and(|id| self.delete(id))
    }

    pub fn delete_selected(&mut self) -> usize {
        if self.selected.is_empty() {
            return 0;
        }
        self.history.push(self.annotations.clone());
        let doomed = std::mem::take(&mut self.selected);
        self.annotations.retain(|a| !doomed.contains(&a.id));
        for id in &doomed {
            self.forget(*id);
        }
        log::debug!("Deleted {} annotation(s)", doomed.len());
        doomed.len()
    }

    fn forget(&mut self, id: AnnotationId) {
        self.selected.retain(|s| *s != id);
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.drag.as_ref().is_some_and(|d| d.annotation_id == id) {
            self.drag = None;
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.annotations.clone()) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.annotations.clone()) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
        self.drag = None;
        let alive: Vec<AnnotationId> = self.annotations.iter().map(|a| a.id).collect();
        self.selected.retain(|id| alive.contains(id));
        if self.focused.is_some_and(|id| !alive.contains(&id)) {
            self.focused = None;
        }
    }
}

/// Get the next available annotation ID from existing annotations
fn next_id_from_annotations(anns: &[Annotation]) -> AnnotationId {
    anns.iter().map(|a| a.id).max().map(|m| m + 1).unwrap_or(1)
}
