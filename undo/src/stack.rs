//! Undo and redo stacks for one model root.

use tracing::{debug, trace};

use crate::action::{UndoAction, UndoEntry};
use crate::error::{UndoError, UndoResult};

/// Undo/redo history.
///
/// A fresh change pushed with [`UndoStack::push_undo`] invalidates the redo
/// history. The inverse of a redo goes through [`UndoStack::push_redone`],
/// which keeps the remaining redo entries.
#[derive(Debug)]
pub struct UndoStack {
    undo: Vec<UndoEntry>,
    redo: Vec<UndoEntry>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Push the inverse of a fresh change. Clears the redo history.
    pub fn push_undo(&mut self, entry: UndoEntry) {
        if !self.redo.is_empty() {
            debug!(dropped = self.redo.len(), "redo history cleared");
            self.redo.clear();
        }
        trace!(context = ?entry.context, action = %entry.action, "push undo");
        self.undo.push(entry);
    }

    /// Push the inverse of a redone change. The redo history is kept.
    pub fn push_redone(&mut self, entry: UndoEntry) {
        trace!(context = ?entry.context, action = %entry.action, "push redone");
        self.undo.push(entry);
    }

    /// Push an entry onto the redo stack.
    pub fn push_redo(&mut self, entry: UndoEntry) {
        trace!(context = ?entry.context, action = %entry.action, "push redo");
        self.redo.push(entry);
    }

    pub fn pop_undo(&mut self) -> UndoResult<UndoEntry> {
        self.undo.pop().ok_or(UndoError::NothingToUndo)
    }

    pub fn pop_redo(&mut self) -> UndoResult<UndoEntry> {
        self.redo.pop().ok_or(UndoError::NothingToRedo)
    }

    pub fn peek_undo(&self) -> Option<&UndoEntry> {
        self.undo.last()
    }

    pub fn peek_redo(&self) -> Option<&UndoEntry> {
        self.redo.last()
    }

    /// Combine the two newest undo entries into one.
    ///
    /// Entries with different contexts are left as they were and `false` is
    /// returned. Otherwise the merged action runs the newer entry first.
    pub fn merge_top_two(&mut self) -> UndoResult<bool> {
        if self.undo.len() < 2 {
            return Err(UndoError::not_enough_entries(self.undo.len()));
        }
        let (Some(newest), Some(older)) = (self.undo.pop(), self.undo.pop()) else {
            return Err(UndoError::not_enough_entries(0));
        };
        if newest.context != older.context {
            debug!(
                newest = ?newest.context,
                older = ?older.context,
                "undo entries have different contexts; not merged"
            );
            self.undo.push(older);
            self.undo.push(newest);
            return Ok(false);
        }
        let merged = UndoEntry::new(
            newest.context,
            UndoAction::Group(vec![newest.action, older.action]),
        );
        trace!(action = %merged.action, "merged undo entries");
        self.undo.push(merged);
        Ok(true)
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Drop all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
