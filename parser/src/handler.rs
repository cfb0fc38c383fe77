//! Error-handling policy for element-level parse failures.

use tracing::warn;

use crate::error::ParseError;

/// What the builder does after an element fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Skip the failing element (and its body) and keep parsing.
    Continue,
    /// Stop parsing; changes applied so far are kept.
    Cancel,
    /// Abort the parse and return the error to the caller.
    Rethrow,
}

/// Decides how parse errors are surfaced.
pub trait ErrorHandler: Send {
    /// Called once per failing element. `context` is the full name of the
    /// container the element was applied in, if any.
    fn handle_error(
        &mut self,
        element: &str,
        context: Option<&str>,
        error: &ParseError,
    ) -> ErrorAction;

    /// Turn element skipping on or off.
    fn enable_error_skipping(&mut self, enable: bool);
}

/// Always propagates errors. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct RethrowHandler;

impl ErrorHandler for RethrowHandler {
    fn handle_error(&mut self, _: &str, _: Option<&str>, _: &ParseError) -> ErrorAction {
        ErrorAction::Rethrow
    }

    fn enable_error_skipping(&mut self, _: bool) {}
}

/// Logs and skips failing elements while skipping is enabled; rethrows
/// otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkippingHandler {
    skipping: bool,
}

impl SkippingHandler {
    pub fn is_skipping(&self) -> bool {
        self.skipping
    }
}

impl ErrorHandler for SkippingHandler {
    fn handle_error(
        &mut self,
        element: &str,
        context: Option<&str>,
        error: &ParseError,
    ) -> ErrorAction {
        if !self.skipping {
            return ErrorAction::Rethrow;
        }
        warn!(
            element,
            context = context.unwrap_or("<top>"),
            %error,
            "skipping element"
        );
        ErrorAction::Continue
    }

    fn enable_error_skipping(&mut self, enable: bool) {
        self.skipping = enable;
    }
}
