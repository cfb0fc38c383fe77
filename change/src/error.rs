//! Change error types.

use std::time::Duration;

use mml_core::NodeId;
use mml_parser::ParseError;
use thiserror::Error;

/// Errors reported for change requests.
#[derive(Debug, Error)]
pub enum ChangeError {
    /// The MML could not be applied.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The context node no longer exists.
    #[error("context {context} no longer exists")]
    ContextRemoved { context: NodeId },

    /// The error handler cancelled the parse.
    #[error("change cancelled: {description}")]
    Cancelled { description: String },

    /// Structural problem with the request, such as a deferral cycle.
    #[error("structural error: {0}")]
    Structural(String),

    /// A waited-for change failed.
    #[error("change failed: {0}")]
    Failed(String),

    /// Waiting for completion timed out.
    #[error("timed out after {timeout:?} waiting for change")]
    Timeout { timeout: Duration },
}

impl ChangeError {
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }

    pub fn cancelled(description: impl Into<String>) -> Self {
        Self::Cancelled {
            description: description.into(),
        }
    }
}

/// Result type for change operations.
pub type ChangeResult<T> = Result<T, ChangeError>;
