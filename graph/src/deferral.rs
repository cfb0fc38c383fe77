//! Class deferral: instantiation by cloning and the `deferred_from` fan-out.

use std::collections::HashMap;

use mml_core::{ContainerClass, GraphError, GraphResult, NodeId, NodeKind};
use tracing::debug;

use crate::graph::Graph;

impl Graph {
    /// Nodes whose definition is deferred to `id`.
    pub fn deferred_from(&self, id: NodeId) -> &[NodeId] {
        self.get_node(id)
            .map(|n| n.deferred_from.as_slice())
            .unwrap_or(&[])
    }

    /// Class `id` defers to, if any.
    pub fn defers_to(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|n| n.defers_to)
    }

    /// Record that `instance` defers its definition to `class`.
    pub fn add_deferral(&mut self, class: NodeId, instance: NodeId) -> GraphResult<()> {
        if class == instance || self.defer_chain_contains(class, instance) {
            return Err(GraphError::DeferralCycle {
                node: self.full_name(instance),
            });
        }
        let previous = self.node(instance)?.defers_to;
        if let Some(previous) = previous {
            if let Some(prev) = self.get_node_mut(previous) {
                prev.deferred_from.retain(|d| *d != instance);
            }
        }
        self.node_mut(instance)?.defers_to = Some(class);
        let class_node = self.node_mut(class)?;
        if !class_node.deferred_from.contains(&instance) {
            class_node.deferred_from.push(instance);
        }
        self.touch();
        Ok(())
    }

    /// Returns true if following `defers_to` from `start` reaches `target`.
    fn defer_chain_contains(&self, start: NodeId, target: NodeId) -> bool {
        let mut current = self.defers_to(start);
        let mut steps = 0usize;
        while let Some(next) = current {
            if next == target {
                return true;
            }
            steps += 1;
            if steps > self.node_count() {
                return true;
            }
            current = self.defers_to(next);
        }
        false
    }

    /// Find a class definition visible from `scope`.
    ///
    /// Searches `scope` and its containers for a child class with the given
    /// name, then the top-level classes. A name beginning with a period is
    /// resolved as a full name.
    pub fn find_class(&self, scope: Option<NodeId>, name: &str) -> Option<NodeId> {
        let is_class = |id: &NodeId| self.get_node(*id).is_some_and(|n| n.kind == NodeKind::Class);

        if name.starts_with('.') {
            return self.lookup_full_name(name).filter(is_class);
        }
        if let Some(scope) = scope {
            let mut candidates = vec![scope];
            candidates.extend(self.ancestors(scope));
            for container in candidates {
                if let Some(found) = self.lookup(container, name).filter(is_class) {
                    return Some(found);
                }
            }
        }
        self.find_root(name).filter(is_class)
    }

    /// Create `name` in `container` as a clone of `class`, deferring to it.
    ///
    /// The whole subtree of the class is cloned, including links internal to
    /// it. Cloned nodes that themselves deferred to another class are
    /// registered with that class too.
    pub fn instantiate(
        &mut self,
        class: NodeId,
        container: Option<NodeId>,
        name: &str,
        kind: NodeKind,
        class_name: &str,
    ) -> GraphResult<NodeId> {
        self.expect_kind(class, NodeKind::Class)?;
        if let Some(container) = container {
            if self.is_within(container, class) {
                return Err(GraphError::DeferralCycle {
                    node: self.full_name(class),
                });
            }
        }

        let root = self.create_node(container, kind, name, class_name)?;
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        mapping.insert(class, root);

        // Clone in preorder so containers exist before their children.
        for original in self.descendants(class) {
            let source = self.node(original)?.clone();
            let Some(parent) = source.container.and_then(|c| mapping.get(&c).copied()) else {
                continue;
            };
            let copy = self.create_node(Some(parent), source.kind, &source.name, &source.class_name)?;
            let node = self.node_mut(copy)?;
            node.value = source.value.clone();
            node.token = source.token.clone();
            node.shared = source.shared.clone().map(|mut s| {
                s.suppressing = false;
                s
            });
            node.persistent = source.persistent;
            mapping.insert(original, copy);
            if let Some(inner_class) = source.defers_to {
                let target = mapping.get(&inner_class).copied().unwrap_or(inner_class);
                self.add_deferral(target, copy)?;
            }
        }

        // Links internal to the class subtree.
        let pairs: Vec<(NodeId, NodeId)> = mapping
            .iter()
            .filter(|(original, _)| {
                self.get_node(**original)
                    .is_some_and(|n| n.kind == NodeKind::Port)
            })
            .flat_map(|(original, copy)| {
                self.linked_relations(*original)
                    .iter()
                    .filter_map(|r| mapping.get(r).map(|mapped| (*copy, *mapped)))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (port, relation) in pairs {
            self.link(port, relation)?;
        }

        self.add_deferral(class, root)?;
        debug!(class = %self.full_name(class), instance = %self.full_name(root), "instantiated class");
        Ok(root)
    }

    /// Tag check used by shared parameters: does `id` match `container_class`?
    pub fn is_instance_of(&self, id: NodeId, container_class: &ContainerClass) -> bool {
        let Some(node) = self.get_node(id) else {
            return false;
        };
        match container_class {
            ContainerClass::Kind(kind) => node.kind == *kind,
            ContainerClass::Named(name) => {
                if node.class_name == *name {
                    return true;
                }
                let mut current = node.defers_to;
                let mut steps = 0usize;
                while let Some(class) = current {
                    let Some(class_node) = self.get_node(class) else {
                        return false;
                    };
                    if class_node.name == *name || class_node.class_name == *name {
                        return true;
                    }
                    steps += 1;
                    if steps > self.node_count() {
                        return false;
                    }
                    current = class_node.defers_to;
                }
                false
            }
        }
    }
}
