//! The MML parser: reads text, runs it through the filter chain and applies
//! it to a graph.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mml_core::NodeId;
use mml_graph::Graph;
use tracing::debug;

use crate::builder::Builder;
use crate::error::ParseResult;
use crate::event::read_events;
use crate::filter::{FilterChain, MomlFilter};
use crate::handler::{ErrorHandler, RethrowHandler};

/// Parser settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Run the filter chain. Off for injected and replayed MML.
    pub filters_enabled: bool,
    /// Passed to the error handler before every parse.
    pub error_skipping: bool,
    /// Directory `<input source>` paths are resolved against.
    pub base: Option<PathBuf>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            filters_enabled: true,
            error_skipping: false,
            base: None,
        }
    }
}

impl ParserConfig {
    pub fn with_filters_enabled(mut self, enabled: bool) -> Self {
        self.filters_enabled = enabled;
        self
    }

    pub fn with_error_skipping(mut self, skipping: bool) -> Self {
        self.error_skipping = skipping;
        self
    }

    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }
}

/// What a parse did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Top-level node of the parsed model.
    pub toplevel: Option<NodeId>,
    /// MML fragments that undo the parse, newest first. Replaying them in
    /// order in the same context restores the previous state.
    pub inverse: Vec<String>,
    /// The error handler cancelled the parse.
    pub cancelled: bool,
    /// Elements dropped by filters or skipped after errors.
    pub skipped: usize,
}

/// Applies MML to a graph.
///
/// A parser handles one parse at a time. It keeps the top-level of its last
/// parse until [`reset`](Self::reset).
pub struct MomlParser {
    config: ParserConfig,
    filters: Option<Vec<Arc<dyn MomlFilter>>>,
    handler: Box<dyn ErrorHandler>,
    toplevel: Option<NodeId>,
}

impl fmt::Debug for MomlParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MomlParser")
            .field("config", &self.config)
            .field("filters", &self.filters)
            .field("toplevel", &self.toplevel)
            .finish_non_exhaustive()
    }
}

impl Default for MomlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MomlParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            filters: None,
            handler: Box::new(RethrowHandler),
            toplevel: None,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ParserConfig {
        &mut self.config
    }

    /// Use an explicit filter list instead of the process-wide registry.
    /// `None` goes back to the registry.
    pub fn set_filters(&mut self, filters: Option<Vec<Arc<dyn MomlFilter>>>) {
        self.filters = filters;
    }

    pub fn set_error_handler(&mut self, handler: Box<dyn ErrorHandler>) {
        self.handler = handler;
    }

    /// Forget the top-level of the previous parse.
    pub fn reset(&mut self) {
        self.toplevel = None;
    }

    /// Top-level node of the last parse.
    pub fn toplevel(&self) -> Option<NodeId> {
        self.toplevel
    }

    fn chain(&self) -> FilterChain {
        if !self.config.filters_enabled {
            return FilterChain::empty();
        }
        match &self.filters {
            Some(filters) => FilterChain::new(filters),
            None => FilterChain::from_registry(),
        }
    }

    /// Apply `text` to `graph`, anchored at `context`. With no context the
    /// text creates (or enters) top-level nodes.
    pub fn parse(
        &mut self,
        graph: &mut Graph,
        context: Option<NodeId>,
        text: &str,
    ) -> ParseResult<ParseOutcome> {
        let events = read_events(text)?;
        let chain = self.chain();
        debug!(
            context = ?context.map(|c| graph.full_name(c)),
            events = events.len(),
            filters = chain.len(),
            "parsing"
        );
        self.handler.enable_error_skipping(self.config.error_skipping);

        let base = self.config.base.clone();
        let result = Builder::new(graph, context, chain, &mut *self.handler, base).build(events)?;

        let toplevel = match context {
            Some(context) if graph.contains(context) => Some(graph.top_level(context)),
            _ => result.toplevel,
        };
        self.toplevel = toplevel;
        Ok(ParseOutcome {
            toplevel,
            inverse: result.inverse,
            cancelled: result.cancelled,
            skipped: result.skipped,
        })
    }

    /// Parse a file. Relative `<input>` paths resolve against its directory
    /// unless a base is configured.
    pub fn parse_file(
        &mut self,
        graph: &mut Graph,
        context: Option<NodeId>,
        path: &Path,
    ) -> ParseResult<ParseOutcome> {
        let text = std::fs::read_to_string(path)?;
        let restore = self.config.base.clone();
        if self.config.base.is_none() {
            self.config.base = path.parent().map(Path::to_path_buf);
        }
        let result = self.parse(graph, context, &text);
        self.config.base = restore;
        result
    }
}
