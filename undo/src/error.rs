//! Undo error types.

use thiserror::Error;

/// Undo stack errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UndoError {
    /// The undo stack is empty.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The redo stack is empty.
    #[error("nothing to redo")]
    NothingToRedo,

    /// Merging needs at least two entries on the undo stack.
    #[error("cannot merge undo entries: {found} on the stack")]
    NotEnoughEntries { found: usize },
}

impl UndoError {
    pub fn not_enough_entries(found: usize) -> Self {
        Self::NotEnoughEntries { found }
    }
}

/// Result type for undo operations.
pub type UndoResult<T> = Result<T, UndoError>;
