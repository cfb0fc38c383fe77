//! Common error types for MML.

use crate::{NodeId, NodeKind};
use thiserror::Error;

/// Errors that can occur during graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Node not found.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// No child with the given name.
    #[error("No object named {name} in {container}")]
    ChildNotFound { container: String, name: String },

    /// Sibling with the same name already exists.
    #[error("Name collision: {container} already contains {name}")]
    NameCollision { container: String, name: String },

    /// Name is empty or contains a period.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Node has the wrong kind for the requested operation.
    #[error("Kind mismatch for {name}: expected {expected}, got {actual}")]
    KindMismatch {
        name: String,
        expected: NodeKind,
        actual: NodeKind,
    },

    /// A class definition cannot be removed while instances defer to it.
    #[error("Cannot delete class {class}: {count} object(s) defer to it")]
    ClassHasInstances { class: String, count: usize },

    /// Link request is structurally invalid.
    #[error("Cannot link {port} to {relation}: {reason}")]
    InvalidLink {
        port: String,
        relation: String,
        reason: String,
    },

    /// Deferral would create a cycle.
    #[error("Deferral cycle through {node}")]
    DeferralCycle { node: String },

    /// Invalid operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl GraphError {
    pub fn child_not_found(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ChildNotFound {
            container: container.into(),
            name: name.into(),
        }
    }

    pub fn name_collision(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NameCollision {
            container: container.into(),
            name: name.into(),
        }
    }

    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_link(
        port: impl Into<String>,
        relation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidLink {
            port: port.into(),
            relation: relation.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;
