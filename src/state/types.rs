use crate::geometry::{Annotation, AnnotationId, BoundingBox, Point};
use crate::handles::Handle;

/// Shape currently being drawn. Points are in image space.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DrawState {
    #[default]
    Idle,
    /// Rectangle drag: anchor and latest pointer position.
    Rectangle { start: Point, current: Point },
    /// Polygon clicks accumulated so far.
    Polygon { points: Vec<Point> },
}

impl DrawState {
    pub fn polygon_points(&self) -> &[Point] {
        match self {
            DrawState::Polygon { points } => points,
            _ => &[],
        }
    }
}

/// Handle drag in progress on the focused annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub annotation_id: AnnotationId,
    pub handle: Handle,
    /// Bounds when the drag started.
    pub original_bbox: BoundingBox,
    /// Annotations before the drag. Moved into the undo history on the first
    /// move that changes geometry.
    pub(crate) undo_snapshot: Option<Vec<Annotation>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectMode {
    /// Select only the clicked annotation.
    #[default]
    Replace,
    /// Flip the clicked annotation in or out of the selection.
    Toggle,
}

/// Snapshot-based undo/redo for the annotation list.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    undo_stack: Vec<Vec<Annotation>>,
    redo_stack: Vec<Vec<Annotation>>,
    max_size: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(50)
    }
}

impl UndoHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Record the state before a mutation. Clears the redo stack.
    pub fn push(&mut self, snapshot: Vec<Annotation>) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    pub fn undo(&mut self, current: Vec<Annotation>) -> Option<Vec<Annotation>> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Vec<Annotation>) -> Option<Vec<Annotation>> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}
