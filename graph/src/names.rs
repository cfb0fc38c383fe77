//! Name resolution: children by name, dotted paths and full names.

use mml_core::NodeId;

use crate::graph::Graph;

impl Graph {
    /// Find a direct child by name.
    pub fn child(&self, container: NodeId, name: &str) -> Option<NodeId> {
        self.children(container)
            .iter()
            .copied()
            .find(|c| self.get_node(*c).is_some_and(|n| n.name == name))
    }

    /// Find a top-level node by name.
    pub fn find_root(&self, name: &str) -> Option<NodeId> {
        self.roots()
            .iter()
            .copied()
            .find(|r| self.get_node(*r).is_some_and(|n| n.name == name))
    }

    /// Name of a node, or an empty string if it does not exist.
    pub fn name(&self, id: NodeId) -> &str {
        self.get_node(id).map(|n| n.name.as_str()).unwrap_or("")
    }

    /// Resolve a dotted path relative to `container`, e.g. `a.b.p`.
    ///
    /// A path starting with a period is resolved as a full name instead.
    pub fn lookup(&self, container: NodeId, path: &str) -> Option<NodeId> {
        if path.starts_with('.') {
            return self.lookup_full_name(path);
        }
        path.split('.')
            .try_fold(container, |current, segment| self.child(current, segment))
    }

    /// Resolve a full name such as `.top.a.b`.
    pub fn lookup_full_name(&self, full_name: &str) -> Option<NodeId> {
        let mut segments = full_name.trim_start_matches('.').split('.');
        let root = self.find_root(segments.next()?)?;
        segments.try_fold(root, |current, segment| self.child(current, segment))
    }

    /// Full name of a node: its container chain joined with periods, with a
    /// leading period.
    pub fn full_name(&self, id: NodeId) -> String {
        let mut parts: Vec<&str> = vec![self.name(id)];
        parts.extend(self.ancestors(id).map(|a| self.name(a)));
        parts.reverse();
        format!(".{}", parts.join("."))
    }

    /// Name of `id` relative to `relative_to`, e.g. `a.in` for port `in` of
    /// entity `a` inside `relative_to`. Falls back to the full name when
    /// `id` is not contained in `relative_to`.
    pub fn relative_name(&self, id: NodeId, relative_to: NodeId) -> String {
        if id == relative_to || !self.is_within(id, relative_to) {
            return self.full_name(id);
        }
        let mut parts: Vec<&str> = vec![self.name(id)];
        for ancestor in self.ancestors(id) {
            if ancestor == relative_to {
                break;
            }
            parts.push(self.name(ancestor));
        }
        parts.reverse();
        parts.join(".")
    }
}
