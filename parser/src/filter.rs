//! Streaming filters applied to the element stream during a parse.
//!
//! A [`MomlFilter`] is a factory registered once; every parse asks each
//! factory for a fresh [`FilterPass`] holding that parse's state, so no
//! tracking state leaks between documents.
//!
//! Attribute values are threaded through the passes in registration order.
//! A pass returning `None` for a present value drops the whole element; a
//! pass returning `None` for an absent value leaves it absent.

use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use mml_core::NodeId;
use mml_graph::Graph;
use tracing::trace;

use crate::error::{FilterError, FilterResult};
use crate::parser::MomlParser;

/// Read-only view handed to attribute filters.
pub struct FilterContext<'a> {
    graph: &'a Graph,
    container: Option<NodeId>,
}

impl<'a> FilterContext<'a> {
    pub fn new(graph: &'a Graph, container: Option<NodeId>) -> Self {
        Self { graph, container }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// The container the element is being applied in.
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    /// Full name of the container, or an empty string at the top level.
    pub fn container_name(&self) -> String {
        self.container
            .map(|c| self.graph.full_name(c))
            .unwrap_or_default()
    }
}

/// Mutable view handed to end-element filters. Filters may inject MML into
/// the element being closed.
pub struct EndElementContext<'a> {
    graph: &'a mut Graph,
    container: Option<NodeId>,
    element: String,
    inverse: Vec<String>,
}

impl<'a> EndElementContext<'a> {
    pub fn new(graph: &'a mut Graph, container: Option<NodeId>, element: &str) -> Self {
        Self {
            graph,
            container,
            element: element.to_string(),
            inverse: Vec::new(),
        }
    }

    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// The node whose element is being closed, or the enclosing container
    /// for elements that do not create a node.
    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn container_name(&self) -> String {
        self.container
            .map(|c| self.graph.full_name(c))
            .unwrap_or_default()
    }

    /// Parse `moml` into the container with a fresh, unfiltered parser.
    pub fn inject(&mut self, moml: &str) -> FilterResult<()> {
        let mut parser = MomlParser::new();
        parser.config_mut().filters_enabled = false;
        let outcome = parser
            .parse(&mut *self.graph, self.container, moml)
            .map_err(|e| FilterError::injection(self.element.clone(), e))?;
        // Outcome inverses are newest-first; keep ours in execution order.
        self.inverse.extend(outcome.inverse.into_iter().rev());
        Ok(())
    }

    /// Inverses of everything injected, in execution order.
    pub(crate) fn into_inverse(self) -> Vec<String> {
        self.inverse
    }
}

/// Per-parse state of one filter.
pub trait FilterPass: Send {
    /// Rewrite one attribute occurrence.
    fn filter_attribute_value(
        &mut self,
        context: &FilterContext<'_>,
        element: &str,
        attribute: &str,
        value: Option<&str>,
    ) -> FilterResult<Option<String>>;

    /// Observe the end of an element. Returns the (possibly renamed) element
    /// name, or `None` to stop later filters from seeing it.
    fn filter_end_element(
        &mut self,
        _context: &mut EndElementContext<'_>,
        element: &str,
    ) -> FilterResult<Option<String>> {
        Ok(Some(element.to_string()))
    }
}

/// A registered filter: a factory for per-parse passes.
pub trait MomlFilter: Send + Sync + Debug {
    fn name(&self) -> &str;

    fn new_pass(&self) -> Box<dyn FilterPass>;
}

/// The passes of one parse, in registration order.
#[derive(Default)]
pub struct FilterChain {
    passes: Vec<Box<dyn FilterPass>>,
}

impl FilterChain {
    /// Start a pass of every filter.
    pub fn new(filters: &[Arc<dyn MomlFilter>]) -> Self {
        Self {
            passes: filters.iter().map(|f| f.new_pass()).collect(),
        }
    }

    /// A chain with no filters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A chain over the process-wide registry.
    pub fn from_registry() -> Self {
        Self::new(&registered_filters())
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Thread `value` through every pass. `None` for a present input means
    /// drop the element, and later passes are not consulted.
    pub fn filter_attribute_value(
        &mut self,
        context: &FilterContext<'_>,
        element: &str,
        attribute: &str,
        value: Option<String>,
    ) -> FilterResult<Option<String>> {
        let mut current = value;
        for pass in &mut self.passes {
            let present = current.is_some();
            let next = pass.filter_attribute_value(context, element, attribute, current.as_deref())?;
            if present && next.is_none() {
                trace!(element, attribute, "filter dropped element");
                return Ok(None);
            }
            if next != current {
                trace!(element, attribute, from = ?current, to = ?next, "filter rewrote attribute");
            }
            current = next;
        }
        Ok(current)
    }

    /// Thread the element name through every pass.
    pub fn filter_end_element(
        &mut self,
        context: &mut EndElementContext<'_>,
        element: &str,
    ) -> FilterResult<Option<String>> {
        let mut current = element.to_string();
        for pass in &mut self.passes {
            match pass.filter_end_element(context, &current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

static REGISTRY: RwLock<Vec<Arc<dyn MomlFilter>>> = RwLock::new(Vec::new());

/// Append a filter to the process-wide registry.
pub fn register_filter(filter: Arc<dyn MomlFilter>) {
    let mut registry = REGISTRY.write().unwrap_or_else(|e| e.into_inner());
    registry.push(filter);
}

/// The registered filters, in registration order.
pub fn registered_filters() -> Vec<Arc<dyn MomlFilter>> {
    REGISTRY.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// Empty the process-wide registry.
pub fn clear_filters() {
    REGISTRY.write().unwrap_or_else(|e| e.into_inner()).clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use mml_core::{NodeKind, DEFAULT_ENTITY_CLASS};

    #[derive(Debug)]
    struct Upper;

    struct UpperPass;

    impl FilterPass for UpperPass {
        fn filter_attribute_value(
            &mut self,
            _: &FilterContext<'_>,
            _: &str,
            attribute: &str,
            value: Option<&str>,
        ) -> FilterResult<Option<String>> {
            Ok(match (attribute, value) {
                ("class", Some(v)) => Some(v.to_uppercase()),
                (_, v) => v.map(str::to_string),
            })
        }
    }

    impl MomlFilter for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn new_pass(&self) -> Box<dyn FilterPass> {
            Box::new(UpperPass)
        }
    }

    #[derive(Debug)]
    struct DropAll;

    struct DropAllPass {
        calls: usize,
    }

    impl FilterPass for DropAllPass {
        fn filter_attribute_value(
            &mut self,
            _: &FilterContext<'_>,
            _: &str,
            _: &str,
            _: Option<&str>,
        ) -> FilterResult<Option<String>> {
            self.calls += 1;
            Ok(None)
        }
    }

    impl MomlFilter for DropAll {
        fn name(&self) -> &str {
            "drop-all"
        }

        fn new_pass(&self) -> Box<dyn FilterPass> {
            Box::new(DropAllPass { calls: 0 })
        }
    }

    #[test]
    fn test_values_thread_through_passes() {
        // GIVEN
        let graph = Graph::new();
        let context = FilterContext::new(&graph, None);
        let filters: Vec<Arc<dyn MomlFilter>> = vec![Arc::new(Upper), Arc::new(Upper)];
        let mut chain = FilterChain::new(&filters);

        // WHEN
        let value = chain
            .filter_attribute_value(&context, "entity", "class", Some("gain".to_string()))
            .unwrap();

        // THEN
        assert_eq!(value.as_deref(), Some("GAIN"));
    }

    #[test]
    fn test_null_means_drop_only_for_present_values() {
        // GIVEN
        let graph = Graph::new();
        let context = FilterContext::new(&graph, None);
        let filters: Vec<Arc<dyn MomlFilter>> = vec![Arc::new(DropAll), Arc::new(Upper)];
        let mut chain = FilterChain::new(&filters);

        // WHEN
        let absent = chain
            .filter_attribute_value(&context, "entity", "class", None)
            .unwrap();
        let present = chain
            .filter_attribute_value(&context, "entity", "class", Some("x".to_string()))
            .unwrap();

        // THEN - both are None, told apart only by the input
        assert_eq!(absent, None);
        assert_eq!(present, None);
    }

    #[test]
    fn test_end_element_injection() {
        // GIVEN
        let mut graph = Graph::new();
        let top = graph
            .create_node(None, NodeKind::Entity, "top", DEFAULT_ENTITY_CLASS)
            .unwrap();
        let mut context = EndElementContext::new(&mut graph, Some(top), "entity");

        // WHEN
        context
            .inject(r#"<property name="_hideName" class="mml.SingletonAttribute"/>"#)
            .unwrap();
        let inverse = context.into_inverse();

        // THEN
        assert!(graph.child(top, "_hideName").is_some());
        assert_eq!(inverse, vec![r#"<deleteProperty name="_hideName"/>"#.to_string()]);
    }

    #[test]
    fn test_failed_injection_is_an_error() {
        // GIVEN
        let mut graph = Graph::new();
        let mut context = EndElementContext::new(&mut graph, None, "entity");

        // WHEN
        let result = context.inject("<bogus/>");

        // THEN
        assert!(matches!(result, Err(FilterError::Injection { .. })));
    }
}
