//! Completion handles for change requests.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::error::{ChangeError, ChangeResult};
use crate::model::ModelConfig;

/// How a change request finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Executed,
    Failed(String),
}

#[derive(Debug, Default)]
struct State {
    completion: Mutex<Option<Completion>>,
    done: Condvar,
}

/// Shared view of a request's outcome. Cloning yields another view of the
/// same request.
#[derive(Debug, Clone, Default)]
pub struct ChangeHandle {
    state: Arc<State>,
}

impl ChangeHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome. Only the first completion counts.
    pub(crate) fn complete(&self, completion: Completion) {
        let mut slot = self
            .state
            .completion
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(completion);
            self.state.done.notify_all();
        }
    }

    /// The outcome, if the request has finished.
    pub fn completion(&self) -> Option<Completion> {
        self.state
            .completion
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_complete(&self) -> bool {
        self.completion().is_some()
    }

    /// Block until the request finishes or `timeout` elapses.
    ///
    /// The queue must be drained by another thread. Waiting on the thread
    /// that drains the model's queue never completes and ends in a timeout.
    pub fn wait_for_completion(&self, timeout: Duration) -> ChangeResult<()> {
        let slot = self
            .state
            .completion
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let (slot, _) = self
            .state
            .done
            .wait_timeout_while(slot, timeout, |completion| completion.is_none())
            .unwrap_or_else(|e| e.into_inner());
        match &*slot {
            Some(Completion::Executed) => Ok(()),
            Some(Completion::Failed(message)) => Err(ChangeError::Failed(message.clone())),
            None => Err(ChangeError::Timeout { timeout }),
        }
    }

    /// [`ChangeHandle::wait_for_completion`] with the model's configured
    /// timeout.
    pub fn wait(&self, config: &ModelConfig) -> ChangeResult<()> {
        self.wait_for_completion(config.wait_timeout)
    }
}
