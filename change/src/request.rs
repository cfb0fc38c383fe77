//! Change requests.

use std::fmt;
use std::path::{Path, PathBuf};

use mml_core::NodeId;

use crate::handle::ChangeHandle;

/// Who asked for a change. Opaque to the model; passed back to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Originator(String);

impl Originator {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Originator of undo and redo requests issued by the model.
    pub fn undo() -> Self {
        Self::new("undo")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Originator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Originator {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Originator {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Where the inverse of an executed request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoMode {
    /// A fresh change: inverse onto the undo stack, clearing redo.
    #[default]
    Forward,
    /// Executing an undo entry: inverse onto the redo stack.
    Undo,
    /// Executing a redo entry: inverse onto the undo stack, redo kept.
    Redo,
}

/// A request to apply MML text to a model.
///
/// Consumed exactly once. The outcome is reported to every listener of the
/// model and to the request's [`ChangeHandle`].
#[derive(Debug)]
pub struct ChangeRequest {
    originator: Originator,
    context: Option<NodeId>,
    moml: String,
    base: Option<PathBuf>,
    undoable: bool,
    merge_with_previous: bool,
    propagating: bool,
    description: Option<String>,
    mode: UndoMode,
    /// Contexts this request already ran in along its replication chain.
    lineage: Vec<NodeId>,
    handle: ChangeHandle,
}

impl ChangeRequest {
    /// Create a request to parse `moml` in `context`. With no context the
    /// text addresses top-level objects.
    pub fn new(originator: impl Into<Originator>, context: Option<NodeId>, moml: impl Into<String>) -> Self {
        Self {
            originator: originator.into(),
            context,
            moml: moml.into(),
            base: None,
            undoable: false,
            merge_with_previous: false,
            propagating: false,
            description: None,
            mode: UndoMode::Forward,
            lineage: context.into_iter().collect(),
            handle: ChangeHandle::new(),
        }
    }

    /// Directory that `<input>` sources are resolved against.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Record the inverse so the change can be undone.
    pub fn undoable(mut self, undoable: bool) -> Self {
        self.undoable = undoable;
        self
    }

    /// Fold the undo entry into the previous one so both undo together.
    pub fn merge_with_previous(mut self, merge: bool) -> Self {
        self.merge_with_previous = merge;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn with_mode(mut self, mode: UndoMode) -> Self {
        self.mode = mode;
        self
    }

    /// The same change, applied to an object that defers to this request's
    /// context.
    pub(crate) fn replica(&self, context: NodeId) -> Self {
        let mut lineage = self.lineage.clone();
        lineage.push(context);
        Self {
            originator: self.originator.clone(),
            context: Some(context),
            moml: self.moml.clone(),
            base: self.base.clone(),
            undoable: self.undoable,
            merge_with_previous: self.merge_with_previous,
            propagating: true,
            description: self.description.clone(),
            mode: self.mode,
            lineage,
            handle: ChangeHandle::new(),
        }
    }

    pub fn originator(&self) -> &Originator {
        &self.originator
    }

    pub fn context(&self) -> Option<NodeId> {
        self.context
    }

    pub fn moml(&self) -> &str {
        &self.moml
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    pub fn is_undoable(&self) -> bool {
        self.undoable
    }

    pub fn is_merge_with_previous(&self) -> bool {
        self.merge_with_previous
    }

    /// True for replicas created by deferral propagation.
    pub fn is_propagating(&self) -> bool {
        self.propagating
    }

    pub fn mode(&self) -> UndoMode {
        self.mode
    }

    pub fn lineage(&self) -> &[NodeId] {
        &self.lineage
    }

    /// Description for logs and listeners; falls back to the MML text.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.moml)
    }

    /// Handle that completes when this request has executed or failed.
    pub fn handle(&self) -> ChangeHandle {
        self.handle.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        // GIVEN/WHEN
        let request = ChangeRequest::new("editor", Some(NodeId::new(3)), "<entity name=\"a\"/>")
            .with_base("/tmp")
            .undoable(true)
            .merge_with_previous(true);

        // THEN
        assert_eq!(request.originator().as_str(), "editor");
        assert_eq!(request.context(), Some(NodeId::new(3)));
        assert_eq!(request.base(), Some(Path::new("/tmp")));
        assert!(request.is_undoable());
        assert!(request.is_merge_with_previous());
        assert!(!request.is_propagating());
        assert_eq!(request.mode(), UndoMode::Forward);
        assert_eq!(request.description(), "<entity name=\"a\"/>");
    }

    #[test]
    fn test_replica_extends_lineage() {
        // GIVEN
        let request = ChangeRequest::new("editor", Some(NodeId::new(1)), "<x/>")
            .undoable(true)
            .with_description("edit");

        // WHEN
        let replica = request.replica(NodeId::new(2));

        // THEN
        assert!(replica.is_propagating());
        assert!(replica.is_undoable());
        assert_eq!(replica.context(), Some(NodeId::new(2)));
        assert_eq!(replica.lineage(), &[NodeId::new(1), NodeId::new(2)]);
        assert_eq!(replica.moml(), "<x/>");
        assert_eq!(replica.description(), "edit");
    }
}
