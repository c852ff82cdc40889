//! Editing state.
//!
//! - Drawing, drag and selection modes plus undo/redo history
//! - The per-image [`Editor`]
//! - Filesystem dataset storage
//! - Navigation across a project's images

mod types;
mod editor;
mod dataset;
mod session;

pub use types::*;
pub use editor::*;
pub use dataset::*;
pub use session::*;
