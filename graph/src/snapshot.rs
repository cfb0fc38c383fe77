//! Structural snapshots of a model subtree.
//!
//! Snapshots ignore child order and node identities, so two models built by
//! different edit histories compare equal when they have the same names,
//! classes, values and links.

use std::collections::{BTreeMap, BTreeSet};

use mml_core::{NodeId, NodeKind};

use crate::graph::Graph;

/// Summary of a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSummary {
    pub kind: NodeKind,
    pub class_name: String,
    pub value: Option<String>,
}

/// Order-insensitive structural view of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Nodes keyed by their name relative to the snapshot root.
    pub nodes: BTreeMap<String, NodeSummary>,
    /// (port, relation) pairs by relative name.
    pub links: BTreeSet<(String, String)>,
}

impl Snapshot {
    /// Number of nodes captured.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Graph {
    /// Capture the structure of `root` and everything under it.
    pub fn snapshot(&self, root: NodeId) -> Snapshot {
        let mut snapshot = Snapshot::default();
        let mut members = vec![root];
        members.extend(self.descendants(root));
        for id in members {
            let Some(node) = self.get_node(id) else {
                continue;
            };
            let key = if id == root {
                ".".to_string()
            } else {
                self.relative_name(id, root)
            };
            snapshot.nodes.insert(
                key.clone(),
                NodeSummary {
                    kind: node.kind,
                    class_name: node.class_name.clone(),
                    value: node.value.clone(),
                },
            );
            for relation in &node.links {
                snapshot
                    .links
                    .insert((key.clone(), self.relative_name(*relation, root)));
            }
        }
        snapshot
    }
}
