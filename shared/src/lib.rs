//! MML Shared Parameters
//!
//! A shared parameter keeps its value identical across every parameter in
//! the model with the same name whose container matches the parameter's
//! container class.
//!
//! Responsibilities:
//! - Compute the sharing root (disabled inside component libraries)
//! - Find siblings with a full tree walk from the root
//! - Infer an initial value from existing siblings
//! - Propagate writes and validation under a re-entrancy guard
//!
//! Library subtrees are never entered by the walk, so parameters inside a
//! library neither send nor receive values.

use mml_core::{ContainerClass, GraphResult, NodeId, NodeKind, SHARED_PARAMETER_CLASS};
use mml_graph::{Graph, SharedInfo};
use tracing::{debug, trace};

/// The root under which `node` shares its value, or `None` if `node` lives
/// inside a library.
pub fn root(graph: &Graph, node: NodeId) -> Option<NodeId> {
    let mut result = node;
    for ancestor in graph.ancestors(node) {
        if graph.is_library(ancestor) {
            return None;
        }
        result = ancestor;
    }
    Some(result)
}

/// All shared parameters under `root` that count as the same parameter as
/// `node` (including `node` itself), in tree-walk order.
pub fn siblings(graph: &Graph, root: NodeId, node: NodeId) -> Vec<NodeId> {
    let Some(target) = graph.get_node(node) else {
        return Vec::new();
    };
    let Some(container_class) = target.shared.as_ref().and_then(|s| s.container_class.clone())
    else {
        return Vec::new();
    };

    let mut result = Vec::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        if let Some(candidate) = graph.get_node(current) {
            let matches = candidate.kind == NodeKind::Attribute
                && candidate.is_shared()
                && candidate.name == target.name
                && candidate
                    .container
                    .is_some_and(|c| graph.is_instance_of(c, &container_class));
            if matches {
                result.push(current);
            }
        }
        for child in graph.children(current).iter().rev() {
            if !graph.is_library(*child) {
                stack.push(*child);
            }
        }
    }
    result
}

/// Turn an existing attribute into a shared parameter.
///
/// `container_class` defaults to the class of the attribute's container. The
/// initial value comes from the other siblings (the last one found wins), or
/// from `default` when there are none.
pub fn attach(
    graph: &mut Graph,
    node: NodeId,
    container_class: Option<ContainerClass>,
    default: Option<&str>,
) -> GraphResult<()> {
    let container_class = match container_class {
        Some(class) => class,
        None => {
            let container = graph.container(node);
            match container.and_then(|c| graph.get_node(c)) {
                Some(c) => ContainerClass::Named(c.class_name.clone()),
                None => ContainerClass::Kind(NodeKind::Entity),
            }
        }
    };
    graph.set_shared(node, Some(SharedInfo::new(container_class)))?;

    let mut inferred: Option<String> = None;
    if let Some(root) = root(graph, node) {
        for sibling in siblings(graph, root, node) {
            if sibling == node {
                continue;
            }
            if let Some(value) = graph.value(sibling) {
                inferred = Some(value.to_string());
            }
        }
    }
    let initial = inferred.or_else(|| default.map(str::to_string));
    if initial.is_some() && graph.value(node).is_none() {
        graph.set_value(node, initial)?;
    }
    Ok(())
}

/// Create a shared parameter in `container`.
pub fn create(
    graph: &mut Graph,
    container: NodeId,
    name: &str,
    container_class: Option<ContainerClass>,
    default: Option<&str>,
) -> GraphResult<NodeId> {
    let id = graph.create_node(
        Some(container),
        NodeKind::Attribute,
        name,
        SHARED_PARAMETER_CLASS,
    )?;
    attach(graph, id, container_class, default)?;
    Ok(id)
}

fn propagation_targets(graph: &Graph, node: NodeId) -> Vec<NodeId> {
    let Some(info) = graph.shared_info(node) else {
        return Vec::new();
    };
    if info.suppressing || info.container_class.is_none() {
        return Vec::new();
    }
    match root(graph, node) {
        Some(root) => siblings(graph, root, node)
            .into_iter()
            .filter(|s| *s != node)
            .collect(),
        None => Vec::new(),
    }
}

/// Set the expression of an attribute, propagating to its siblings if it is
/// a shared parameter.
///
/// Each sibling is written only if its value differs, with its suppression
/// flag raised for the duration of the write (and cleared even if the write
/// fails).
pub fn set_expression(graph: &mut Graph, node: NodeId, value: &str) -> GraphResult<()> {
    graph.set_value(node, Some(value.to_string()))?;

    let targets = propagation_targets(graph, node);
    if !targets.is_empty() {
        debug!(parameter = %graph.full_name(node), siblings = targets.len(), "propagating shared value");
    }
    for sibling in targets {
        graph.set_suppressing(sibling, true)?;
        let result = if graph.value(sibling) != Some(value) {
            trace!(sibling = %graph.full_name(sibling), "writing shared value");
            set_expression(graph, sibling, value)
        } else {
            Ok(())
        };
        graph.set_suppressing(sibling, false)?;
        result?;
    }
    Ok(())
}

/// Validate an attribute, and validate its siblings if it is a shared
/// parameter whose container class is established.
pub fn validate(graph: &mut Graph, node: NodeId) -> GraphResult<()> {
    graph.validate_attribute(node)?;
    for sibling in propagation_targets(graph, node) {
        graph.set_suppressing(sibling, true)?;
        let result = validate(graph, sibling);
        graph.set_suppressing(sibling, false)?;
        result?;
    }
    Ok(())
}
