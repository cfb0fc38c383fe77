//! MML Change
//!
//! Queued, MML-driven mutation of a model.
//!
//! Responsibilities:
//! - Queue change requests and execute them in FIFO order
//! - Notify listeners and completion handles of every outcome
//! - Record inverses on the per-root undo stack; undo and redo
//! - Replicate changes to the objects that defer to the changed one

mod error;
mod handle;
mod listener;
mod model;
mod replicate;
mod request;

pub use error::{ChangeError, ChangeResult};
pub use handle::{ChangeHandle, Completion};
pub use listener::{ChangeListener, RecordingListener};
pub use model::{Model, ModelConfig};
pub use replicate::get_deferred_to_parent;
pub use request::{ChangeRequest, Originator, UndoMode};
