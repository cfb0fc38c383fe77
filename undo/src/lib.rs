//! MML Undo
//!
//! Undo information is kept as MML text: executing an entry's action in its
//! context reverses the change that produced it.
//!
//! Responsibilities:
//! - Represent undo actions, with groups as first-class values
//! - Keep the undo and redo stacks of one model root
//! - Merge consecutive entries into a single undoable step

mod action;
mod error;
mod stack;

pub use action::{UndoAction, UndoEntry};
pub use error::{UndoError, UndoResult};
pub use stack::UndoStack;
