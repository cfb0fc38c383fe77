//! Change listeners.

use std::sync::Mutex;

use crate::error::ChangeError;
use crate::request::ChangeRequest;

/// Told about the outcome of every request a model executes, replicas
/// included. Exactly one method is called per request.
pub trait ChangeListener: Send + Sync {
    fn change_executed(&self, request: &ChangeRequest);

    fn change_failed(&self, request: &ChangeRequest, error: &ChangeError);
}

/// Listener that keeps a log of outcomes, as `(description, error)` pairs.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, Option<String>)> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn executed(&self) -> usize {
        self.events().iter().filter(|(_, error)| error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.events().iter().filter(|(_, error)| error.is_some()).count()
    }
}

impl ChangeListener for RecordingListener {
    fn change_executed(&self, request: &ChangeRequest) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((request.description().to_string(), None));
    }

    fn change_failed(&self, request: &ChangeRequest, error: &ChangeError) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((request.description().to_string(), Some(error.to_string())));
    }
}
