//! Core graph storage implementation.

use std::collections::{HashMap, HashSet};

use mml_core::{GraphError, GraphResult, NodeId, NodeKind, LIBRARY_MARKER_NAME};
use tracing::debug;

use crate::node::{Node, SharedInfo};

/// ID allocator for nodes.
#[derive(Debug, Default)]
struct IdAllocator {
    next_node_id: u64,
}

impl IdAllocator {
    fn new() -> Self {
        Self { next_node_id: 1 }
    }

    fn alloc_node_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }
}

/// The in-memory model graph.
///
/// Nodes live in an arena keyed by [`NodeId`]. Containment is a tree: each
/// node lists its children and keeps a back-reference to its container.
/// Deferral (`defers_to` / `deferred_from`) forms a DAG on top of it.
#[derive(Debug)]
pub struct Graph {
    /// Node storage
    nodes: HashMap<NodeId, Node>,
    /// Top-level nodes in creation order
    roots: Vec<NodeId>,
    /// ID allocator
    id_alloc: IdAllocator,
    /// Workspace version token, bumped on every mutation
    version: u64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            id_alloc: IdAllocator::new(),
            version: 0,
        }
    }

    /// Workspace version. Changes whenever the graph is mutated.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn touch(&mut self) {
        self.version += 1;
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Top-level nodes.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    // ==================== Node Operations ====================

    /// Create a new node. `container` of `None` creates a top-level node.
    pub fn create_node(
        &mut self,
        container: Option<NodeId>,
        kind: NodeKind,
        name: &str,
        class_name: &str,
    ) -> GraphResult<NodeId> {
        validate_name(name)?;
        match container {
            Some(container_id) => {
                if !self.nodes.contains_key(&container_id) {
                    return Err(GraphError::NodeNotFound(container_id));
                }
                if self.child(container_id, name).is_some() {
                    return Err(GraphError::name_collision(self.full_name(container_id), name));
                }
            }
            None => {
                if self.find_root(name).is_some() {
                    return Err(GraphError::name_collision("<top>", name));
                }
            }
        }

        let id = self.id_alloc.alloc_node_id();
        let mut node = Node::new(id, kind, name.to_string(), class_name.to_string());
        node.container = container;
        self.nodes.insert(id, node);

        match container {
            Some(container_id) => {
                if let Some(parent) = self.nodes.get_mut(&container_id) {
                    parent.children.push(id);
                }
            }
            None => self.roots.push(id),
        }

        self.touch();
        Ok(id)
    }

    /// Get a node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable reference to a node by ID.
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
    }

    /// Check whether a node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Children of a node in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Container of a node.
    pub fn container(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.container)
    }

    /// Iterate over the containers of a node, nearest first, excluding the node itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.container(id), move |current| self.container(*current))
    }

    /// The top-most container of a node (the node itself if top-level).
    pub fn top_level(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// All nodes contained (transitively) in `id`, preorder, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Returns true if `id` is `ancestor` or is contained in it.
    pub fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Delete a node and everything it contains.
    ///
    /// Links from outside ports into deleted relations are removed, and the
    /// deleted nodes are withdrawn from the deferral lists of their classes.
    /// Fails if a class in the subtree still has instances outside of it.
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<()> {
        let node = self.node(id)?;
        let container = node.container;

        let mut doomed: Vec<NodeId> = vec![id];
        doomed.extend(self.descendants(id));
        let doomed_set: HashSet<NodeId> = doomed.iter().copied().collect();

        for member in &doomed {
            let n = self.node(*member)?;
            let outside = n
                .deferred_from
                .iter()
                .filter(|d| !doomed_set.contains(d))
                .count();
            if outside > 0 {
                return Err(GraphError::ClassHasInstances {
                    class: self.full_name(*member),
                    count: outside,
                });
            }
        }

        // Withdraw from deferral lists of surviving classes.
        for member in &doomed {
            let defers_to = self.nodes.get(member).and_then(|n| n.defers_to);
            if let Some(class_id) = defers_to {
                if !doomed_set.contains(&class_id) {
                    if let Some(class) = self.nodes.get_mut(&class_id) {
                        class.deferred_from.retain(|d| d != member);
                    }
                }
            }
        }

        // Drop links from surviving ports into doomed relations.
        for node in self.nodes.values_mut() {
            if node.kind == NodeKind::Port && !doomed_set.contains(&node.id) {
                node.links.retain(|r| !doomed_set.contains(r));
            }
        }

        for member in &doomed {
            self.nodes.remove(member);
        }
        match container {
            Some(container_id) => {
                if let Some(parent) = self.nodes.get_mut(&container_id) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }

        debug!(node = %id, removed = doomed.len(), "deleted node");
        self.touch();
        Ok(())
    }

    /// Rename a node. Returns the previous name.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> GraphResult<String> {
        validate_name(new_name)?;
        let node = self.node(id)?;
        if node.name == new_name {
            return Ok(new_name.to_string());
        }
        let collision = match node.container {
            Some(container_id) => self.child(container_id, new_name).is_some(),
            None => self.find_root(new_name).is_some(),
        };
        if collision {
            let container_name = node
                .container
                .map(|c| self.full_name(c))
                .unwrap_or_else(|| "<top>".to_string());
            return Err(GraphError::name_collision(container_name, new_name));
        }
        let node = self.node_mut(id)?;
        let old = std::mem::replace(&mut node.name, new_name.to_string());
        node.version += 1;
        self.touch();
        Ok(old)
    }

    // ==================== Attribute Values ====================

    /// Get the expression of an attribute.
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).and_then(|n| n.value.as_deref())
    }

    /// Set the expression of an attribute. Returns the previous expression.
    pub fn set_value(&mut self, id: NodeId, value: Option<String>) -> GraphResult<Option<String>> {
        let node = self.node_mut(id)?;
        let old = std::mem::replace(&mut node.value, value);
        node.version += 1;
        self.touch();
        Ok(old)
    }

    /// Validate an attribute: its expression becomes its current token.
    pub fn validate_attribute(&mut self, id: NodeId) -> GraphResult<()> {
        let node = self.node_mut(id)?;
        node.token = node.value.as_ref().map(|v| v.trim().to_string());
        Ok(())
    }

    /// Mark a node as (non-)persistent.
    pub fn set_persistent(&mut self, id: NodeId, persistent: bool) -> GraphResult<()> {
        self.node_mut(id)?.persistent = persistent;
        Ok(())
    }

    /// Returns true if the node contains a library marker.
    pub fn is_library(&self, id: NodeId) -> bool {
        self.child(id, LIBRARY_MARKER_NAME)
            .and_then(|c| self.nodes.get(&c))
            .is_some_and(|c| c.kind == NodeKind::Attribute)
    }

    // ==================== Shared Parameters ====================

    /// Shared-parameter state of a node.
    pub fn shared_info(&self, id: NodeId) -> Option<&SharedInfo> {
        self.nodes.get(&id).and_then(|n| n.shared.as_ref())
    }

    /// Set or clear the shared-parameter state of a node.
    pub fn set_shared(&mut self, id: NodeId, shared: Option<SharedInfo>) -> GraphResult<()> {
        self.node_mut(id)?.shared = shared;
        Ok(())
    }

    /// Set the propagation suppression flag of a shared parameter.
    pub fn set_suppressing(&mut self, id: NodeId, suppressing: bool) -> GraphResult<()> {
        if let Some(shared) = self.node_mut(id)?.shared.as_mut() {
            shared.suppressing = suppressing;
        }
        Ok(())
    }

    // ==================== Links ====================

    /// Link a port to a relation. Returns false if the link already existed.
    pub fn link(&mut self, port: NodeId, relation: NodeId) -> GraphResult<bool> {
        self.expect_kind(port, NodeKind::Port)?;
        self.expect_kind(relation, NodeKind::Relation)?;

        let relation_container = self.container(relation);
        let port_entity = self.container(port);
        let reachable = port_entity == relation_container
            || port_entity.and_then(|e| self.container(e)) == relation_container;
        if !reachable {
            return Err(GraphError::invalid_link(
                self.full_name(port),
                self.full_name(relation),
                "relation is not visible from the port",
            ));
        }

        let node = self.node_mut(port)?;
        if node.links.contains(&relation) {
            return Ok(false);
        }
        node.links.push(relation);
        self.touch();
        Ok(true)
    }

    /// Remove a link. Returns false if the port was not linked to the relation.
    pub fn unlink(&mut self, port: NodeId, relation: NodeId) -> GraphResult<bool> {
        self.expect_kind(port, NodeKind::Port)?;
        let node = self.node_mut(port)?;
        let before = node.links.len();
        node.links.retain(|r| *r != relation);
        let removed = node.links.len() != before;
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    /// Relations linked to a port.
    pub fn linked_relations(&self, port: NodeId) -> &[NodeId] {
        self.nodes
            .get(&port)
            .map(|n| n.links.as_slice())
            .unwrap_or(&[])
    }

    /// Ports linked to a relation.
    pub fn linked_ports(&self, relation: NodeId) -> Vec<NodeId> {
        let mut ports: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.kind == NodeKind::Port && n.links.contains(&relation))
            .map(|n| n.id)
            .collect();
        ports.sort();
        ports
    }

    pub(crate) fn expect_kind(&self, id: NodeId, expected: NodeKind) -> GraphResult<()> {
        let node = self.node(id)?;
        if node.kind != expected {
            return Err(GraphError::KindMismatch {
                name: self.full_name(id),
                expected,
                actual: node.kind,
            });
        }
        Ok(())
    }
}

/// Names must be non-empty and free of periods (periods separate path segments).
pub fn validate_name(name: &str) -> GraphResult<()> {
    if name.is_empty() {
        return Err(GraphError::invalid_name(name, "name is empty"));
    }
    if name.contains('.') {
        return Err(GraphError::invalid_name(name, "name contains a period"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mml_core::{DEFAULT_ENTITY_CLASS, DEFAULT_PORT_CLASS, DEFAULT_RELATION_CLASS};

    fn model() -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let top = graph
            .create_node(None, NodeKind::Entity, "top", DEFAULT_ENTITY_CLASS)
            .unwrap();
        (graph, top)
    }

    #[test]
    fn test_create_and_lookup() {
        // GIVEN
        let (mut graph, top) = model();

        // WHEN
        let a = graph
            .create_node(Some(top), NodeKind::Entity, "a", DEFAULT_ENTITY_CLASS)
            .unwrap();

        // THEN
        assert_eq!(graph.child(top, "a"), Some(a));
        assert_eq!(graph.container(a), Some(top));
        assert_eq!(graph.top_level(a), top);
        assert_eq!(graph.roots(), &[top]);
    }

    #[test]
    fn test_name_collision() {
        // GIVEN
        let (mut graph, top) = model();
        graph
            .create_node(Some(top), NodeKind::Entity, "a", DEFAULT_ENTITY_CLASS)
            .unwrap();

        // WHEN
        let result = graph.create_node(Some(top), NodeKind::Attribute, "a", "mml.Attribute");

        // THEN
        assert!(matches!(result, Err(GraphError::NameCollision { .. })));
    }

    #[test]
    fn test_invalid_name() {
        let (mut graph, top) = model();
        let result = graph.create_node(Some(top), NodeKind::Entity, "a.b", DEFAULT_ENTITY_CLASS);
        assert!(matches!(result, Err(GraphError::InvalidName { .. })));
    }

    #[test]
    fn test_version_bumps_on_mutation() {
        // GIVEN
        let (mut graph, top) = model();
        let before = graph.version();

        // WHEN
        let p = graph
            .create_node(Some(top), NodeKind::Attribute, "p", "mml.Parameter")
            .unwrap();
        graph.set_value(p, Some("1".to_string())).unwrap();

        // THEN
        assert!(graph.version() > before);
        assert_eq!(graph.value(p), Some("1"));
        assert_eq!(graph.get_node(p).unwrap().version, 2);
    }

    #[test]
    fn test_delete_removes_subtree_and_links() {
        // GIVEN
        let (mut graph, top) = model();
        let a = graph
            .create_node(Some(top), NodeKind::Entity, "a", DEFAULT_ENTITY_CLASS)
            .unwrap();
        let port = graph
            .create_node(Some(a), NodeKind::Port, "in", DEFAULT_PORT_CLASS)
            .unwrap();
        let relation = graph
            .create_node(Some(top), NodeKind::Relation, "r", DEFAULT_RELATION_CLASS)
            .unwrap();
        assert!(graph.link(port, relation).unwrap());

        // WHEN
        graph.delete_node(relation).unwrap();

        // THEN
        assert!(graph.linked_relations(port).is_empty());
        graph.delete_node(a).unwrap();
        assert!(!graph.contains(port));
        assert!(graph.children(top).is_empty());
    }

    #[test]
    fn test_link_is_idempotent() {
        // GIVEN
        let (mut graph, top) = model();
        let a = graph
            .create_node(Some(top), NodeKind::Entity, "a", DEFAULT_ENTITY_CLASS)
            .unwrap();
        let port = graph
            .create_node(Some(a), NodeKind::Port, "out", DEFAULT_PORT_CLASS)
            .unwrap();
        let relation = graph
            .create_node(Some(top), NodeKind::Relation, "r", DEFAULT_RELATION_CLASS)
            .unwrap();

        // WHEN/THEN
        assert!(graph.link(port, relation).unwrap());
        assert!(!graph.link(port, relation).unwrap());
        assert_eq!(graph.linked_ports(relation), vec![port]);
        assert!(graph.unlink(port, relation).unwrap());
        assert!(!graph.unlink(port, relation).unwrap());
    }

    #[test]
    fn test_link_requires_visible_relation() {
        // GIVEN
        let (mut graph, top) = model();
        let a = graph
            .create_node(Some(top), NodeKind::Entity, "a", DEFAULT_ENTITY_CLASS)
            .unwrap();
        let b = graph
            .create_node(Some(top), NodeKind::Entity, "b", DEFAULT_ENTITY_CLASS)
            .unwrap();
        let port = graph
            .create_node(Some(a), NodeKind::Port, "p", DEFAULT_PORT_CLASS)
            .unwrap();
        let hidden = graph
            .create_node(Some(b), NodeKind::Relation, "r", DEFAULT_RELATION_CLASS)
            .unwrap();

        // WHEN
        let result = graph.link(port, hidden);

        // THEN
        assert!(matches!(result, Err(GraphError::InvalidLink { .. })));
    }

    #[test]
    fn test_rename() {
        // GIVEN
        let (mut graph, top) = model();
        let a = graph
            .create_node(Some(top), NodeKind::Entity, "a", DEFAULT_ENTITY_CLASS)
            .unwrap();

        // WHEN
        let old = graph.rename(a, "b").unwrap();

        // THEN
        assert_eq!(old, "a");
        assert_eq!(graph.child(top, "b"), Some(a));
        assert_eq!(graph.child(top, "a"), None);
    }

    #[test]
    fn test_library_marker() {
        // GIVEN
        let (mut graph, top) = model();
        let lib = graph
            .create_node(Some(top), NodeKind::Entity, "lib", DEFAULT_ENTITY_CLASS)
            .unwrap();

        // WHEN
        graph
            .create_node(
                Some(lib),
                NodeKind::Attribute,
                LIBRARY_MARKER_NAME,
                mml_core::LIBRARY_MARKER_CLASS,
            )
            .unwrap();

        // THEN
        assert!(graph.is_library(lib));
        assert!(!graph.is_library(top));
    }
}
