//! The model: a graph plus its change-request queue, listeners, parsers and
//! undo stacks.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use mml_core::NodeId;
use mml_graph::Graph;
use mml_parser::{ErrorHandler, MomlFilter, MomlParser, ParseOutcome, ParserConfig, SkippingHandler};
use mml_undo::{UndoAction, UndoEntry, UndoStack};
use tracing::{debug, warn};

use crate::error::{ChangeError, ChangeResult};
use crate::handle::{ChangeHandle, Completion};
use crate::listener::ChangeListener;
use crate::replicate::{get_deferred_to_parent, replicas};
use crate::request::{ChangeRequest, Originator, UndoMode};

/// Model settings.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Record inverses of undoable requests.
    pub undo_enabled: bool,
    /// Timeout of [`ChangeHandle::wait`].
    pub wait_timeout: Duration,
    /// Settings for the parsers executing requests. A request's base
    /// overrides `parser.base`.
    pub parser: ParserConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            undo_enabled: true,
            wait_timeout: Duration::from_secs(5),
            parser: ParserConfig::default(),
        }
    }
}

impl ModelConfig {
    pub fn with_undo_enabled(mut self, enabled: bool) -> Self {
        self.undo_enabled = enabled;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }
}

type HandlerFactory = Box<dyn Fn() -> Box<dyn ErrorHandler> + Send + Sync>;

/// A model graph mutated through change requests.
///
/// Requests run in FIFO order. Unless the model is deferring, submitting a
/// request drains the queue before returning. Changes made in the context of
/// an object that others defer to are replicated to them after the original
/// request completes.
pub struct Model {
    graph: Graph,
    config: ModelConfig,
    queue: VecDeque<ChangeRequest>,
    listeners: Vec<Arc<dyn ChangeListener>>,
    filters: Option<Vec<Arc<dyn MomlFilter>>>,
    /// One parser per top-level, keyed by root (`None` for requests without
    /// a context). Taken out while in use.
    parsers: HashMap<Option<NodeId>, MomlParser>,
    undo_stacks: HashMap<NodeId, UndoStack>,
    /// Builds the error handler for each request.
    error_handler: HandlerFactory,
    deferring: bool,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("config", &self.config)
            .field("pending", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .field("deferring", &self.deferring)
            .finish_non_exhaustive()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    pub fn with_config(config: ModelConfig) -> Self {
        Self::from_graph(Graph::new(), config)
    }

    /// Wrap an existing graph.
    pub fn from_graph(graph: Graph, config: ModelConfig) -> Self {
        Self {
            graph,
            config,
            queue: VecDeque::new(),
            listeners: Vec::new(),
            filters: None,
            parsers: HashMap::new(),
            undo_stacks: HashMap::new(),
            error_handler: Box::new(|| Box::new(SkippingHandler::default())),
            deferring: false,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Direct access to the graph, bypassing requests, undo and replication.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Filters for forward requests. `None` uses the process-wide registry.
    pub fn set_filters(&mut self, filters: Option<Vec<Arc<dyn MomlFilter>>>) {
        self.filters = filters;
    }

    /// Error policy for requests. Each request gets a handler of its own.
    pub fn set_error_handler<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn ErrorHandler> + Send + Sync + 'static,
    {
        self.error_handler = Box::new(factory);
    }

    pub fn add_change_listener(&mut self, listener: Arc<dyn ChangeListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_change_listener(&mut self, listener: &Arc<dyn ChangeListener>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    // ---------------------------------------------------------------
    // Queue
    // ---------------------------------------------------------------

    /// Queue a request, and run the queue unless deferring.
    pub fn request_change(&mut self, request: ChangeRequest) -> ChangeHandle {
        let handle = request.handle();
        debug!(originator = %request.originator(), description = request.description(), "change requested");
        self.queue.push_back(request);
        if !self.deferring {
            self.execute_change_requests();
        }
        handle
    }

    /// Execute a request now, ahead of the queue, and return its outcome.
    /// Replicas it spawns are queued, and run unless deferring.
    pub fn execute(&mut self, request: ChangeRequest) -> ChangeResult<()> {
        let handle = request.handle();
        self.execute_one(request);
        if !self.deferring {
            self.execute_change_requests();
        }
        match handle.completion() {
            Some(Completion::Failed(message)) => Err(ChangeError::Failed(message)),
            _ => Ok(()),
        }
    }

    /// Run every queued request, including replicas queued along the way.
    pub fn execute_change_requests(&mut self) {
        while let Some(request) = self.queue.pop_front() {
            self.execute_one(request);
        }
    }

    /// While deferring, requests wait in the queue. Turning deferral off runs
    /// the queue.
    pub fn set_deferring_change_requests(&mut self, deferring: bool) {
        self.deferring = deferring;
        if !deferring {
            self.execute_change_requests();
        }
    }

    pub fn is_deferring_change_requests(&self) -> bool {
        self.deferring
    }

    pub fn pending_change_requests(&self) -> usize {
        self.queue.len()
    }

    // ---------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------

    fn execute_one(&mut self, request: ChangeRequest) {
        debug!(
            description = request.description(),
            context = ?request.context().map(|c| self.graph.full_name(c)),
            propagating = request.is_propagating(),
            mode = ?request.mode(),
            "executing change"
        );
        match self.apply(&request) {
            Ok(outcome) => {
                self.record_undo(&request, &outcome);
                if outcome.cancelled {
                    // Instances keep their state; only the class keeps the prefix.
                    self.report_failure(&request, ChangeError::cancelled(request.description()));
                } else {
                    self.queue_replicas(&request, outcome.toplevel);
                    for listener in &self.listeners {
                        listener.change_executed(&request);
                    }
                    request.handle().complete(Completion::Executed);
                }
            }
            Err(error) => self.report_failure(&request, error),
        }
    }

    fn report_failure(&self, request: &ChangeRequest, error: ChangeError) {
        warn!(description = request.description(), %error, "change failed");
        for listener in &self.listeners {
            listener.change_failed(request, &error);
        }
        request.handle().complete(Completion::Failed(error.to_string()));
    }

    fn apply(&mut self, request: &ChangeRequest) -> ChangeResult<ParseOutcome> {
        let context = request.context();
        if let Some(context) = context {
            if !self.graph.contains(context) {
                return Err(ChangeError::ContextRemoved { context });
            }
        }
        let key = context.map(|c| self.graph.top_level(c));

        let mut parser = self
            .parsers
            .remove(&key)
            .unwrap_or_else(|| MomlParser::with_config(self.config.parser.clone()));
        parser.reset();
        parser.set_error_handler((self.error_handler)());
        parser.set_filters(self.filters.clone());
        let config = parser.config_mut();
        *config = self.config.parser.clone();
        // Replayed inverses are already in current form.
        config.filters_enabled = self.config.parser.filters_enabled && request.mode() == UndoMode::Forward;
        if let Some(base) = request.base() {
            config.base = Some(base.to_path_buf());
        }

        let result = parser.parse(&mut self.graph, context, request.moml());
        self.parsers.insert(key, parser);
        Ok(result?)
    }

    fn record_undo(&mut self, request: &ChangeRequest, outcome: &ParseOutcome) {
        if !request.is_undoable() || request.is_propagating() || !self.config.undo_enabled {
            return;
        }
        let Some(context) = request.context() else {
            debug!(description = request.description(), "no context; undo not recorded");
            return;
        };
        let Some(action) = UndoAction::from_fragments(outcome.inverse.clone()) else {
            return;
        };
        let root = self.graph.top_level(context);
        let stack = self.undo_stacks.entry(root).or_default();
        let entry = UndoEntry::new(Some(context), action);
        match request.mode() {
            UndoMode::Forward => {
                stack.push_undo(entry);
                if request.is_merge_with_previous() {
                    if let Err(error) = stack.merge_top_two() {
                        debug!(%error, "nothing to merge with");
                    }
                }
            }
            UndoMode::Undo => stack.push_redo(entry),
            UndoMode::Redo => stack.push_redone(entry),
        }
    }

    fn queue_replicas(&mut self, request: &ChangeRequest, created: Option<NodeId>) {
        let Some(target) = request.context().or(created) else {
            return;
        };
        if !self.graph.contains(target) {
            return;
        }
        for planned in replicas(&self.graph, request, target) {
            match planned {
                Ok(replica) => self.queue.push_back(replica),
                Err((replica, error)) => self.report_failure(&replica, error),
            }
        }
    }

    // ---------------------------------------------------------------
    // Undo
    // ---------------------------------------------------------------

    /// Undo stack of a top-level, if any change has been recorded for it.
    pub fn undo_stack(&self, root: NodeId) -> Option<&UndoStack> {
        self.undo_stacks.get(&root)
    }

    /// Install `stack` as the undo stack of `root`, replacing any previous one.
    pub fn attach_undo_stack(&mut self, root: NodeId, stack: UndoStack) {
        if self.undo_stacks.insert(root, stack).is_some() {
            debug!(root = %self.graph.full_name(root), "undo stack replaced");
        }
    }

    /// Undo the most recent undoable change under `root`.
    ///
    /// Returns `None`, after logging, when there is nothing to undo.
    pub fn undo(&mut self, root: NodeId) -> Option<ChangeHandle> {
        let entry = match self.undo_stacks.get_mut(&root).map(UndoStack::pop_undo) {
            Some(Ok(entry)) => entry,
            Some(Err(error)) => {
                warn!(%error, "undo ignored");
                return None;
            }
            None => {
                warn!(root = %root, "undo ignored: no undo stack");
                return None;
            }
        };
        self.replay(entry, UndoMode::Undo)
    }

    /// Redo the most recently undone change under `root`.
    pub fn redo(&mut self, root: NodeId) -> Option<ChangeHandle> {
        let entry = match self.undo_stacks.get_mut(&root).map(UndoStack::pop_redo) {
            Some(Ok(entry)) => entry,
            Some(Err(error)) => {
                warn!(%error, "redo ignored");
                return None;
            }
            None => {
                warn!(root = %root, "redo ignored: no undo stack");
                return None;
            }
        };
        self.replay(entry, UndoMode::Redo)
    }

    fn replay(&mut self, entry: UndoEntry, mode: UndoMode) -> Option<ChangeHandle> {
        if let Some(context) = entry.context {
            if !self.graph.contains(context) {
                warn!(context = %context, ?mode, "undo entry context no longer exists");
                return None;
            }
        }
        let request = ChangeRequest::new(Originator::undo(), entry.context, entry.action.to_moml())
            .undoable(true)
            .with_mode(mode);
        Some(self.request_change(request))
    }

    /// The nearest of `node` and its containers that other objects defer to.
    pub fn get_deferred_to_parent(&self, node: NodeId) -> Option<NodeId> {
        get_deferred_to_parent(&self.graph, node)
    }
}
