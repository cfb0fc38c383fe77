//! Shared fixtures for the MML integration tests.
//!
//! A [`Workbench`] is a model with a single top-level entity and no
//! compatibility filters, driven by undoable change requests.

use std::sync::Arc;

use mml_change::{ChangeRequest, Model, RecordingListener};
use mml_core::NodeId;
use mml_graph::Snapshot;

pub mod prelude {
    pub use crate::Workbench;
    pub use mml_change::{ChangeRequest, Completion, Model, ModelConfig, RecordingListener};
    pub use mml_core::NodeId;
    pub use mml_graph::Snapshot;
}

pub struct Workbench {
    pub model: Model,
    pub top: NodeId,
    pub listener: Arc<RecordingListener>,
}

impl Workbench {
    /// A model holding `<entity name="top">` built from `body`.
    pub fn new(body: &str) -> Self {
        let mut model = Model::new();
        model.set_filters(Some(Vec::new()));
        let listener = Arc::new(RecordingListener::new());
        model.add_change_listener(listener.clone());
        model
            .execute(ChangeRequest::new(
                "workbench",
                None,
                format!(r#"<entity name="top">{body}</entity>"#),
            ))
            .unwrap();
        let top = model.graph().find_root("top").unwrap();
        Self {
            model,
            top,
            listener,
        }
    }

    /// Apply an undoable change in the top-level.
    pub fn change(&mut self, moml: &str) {
        self.change_in(".top", moml, false);
    }

    /// Apply an undoable change in the object with the given full name.
    pub fn change_in(&mut self, full_name: &str, moml: &str, merge: bool) {
        let context = self.node(full_name);
        self.model
            .execute(
                ChangeRequest::new("test", Some(context), moml)
                    .undoable(true)
                    .merge_with_previous(merge),
            )
            .unwrap();
    }

    pub fn undo(&mut self) {
        self.model.undo(self.top).unwrap();
    }

    pub fn redo(&mut self) {
        self.model.redo(self.top).unwrap();
    }

    pub fn node(&self, full_name: &str) -> NodeId {
        self.model.graph().lookup_full_name(full_name).unwrap()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.model.graph().lookup(self.top, path).is_some()
    }

    pub fn value(&self, path: &str) -> Option<String> {
        let node = self.model.graph().lookup(self.top, path)?;
        self.model.graph().value(node).map(str::to_string)
    }

    /// Write counter of a node.
    pub fn version(&self, path: &str) -> u64 {
        let node = self.model.graph().lookup(self.top, path).unwrap();
        self.model.graph().get_node(node).unwrap().version
    }

    pub fn snapshot(&self) -> Snapshot {
        self.model.graph().snapshot(self.top)
    }

    pub fn undo_len(&self) -> usize {
        self.model.undo_stack(self.top).map_or(0, |s| s.undo_len())
    }

    pub fn redo_len(&self) -> usize {
        self.model.undo_stack(self.top).map_or(0, |s| s.redo_len())
    }
}
