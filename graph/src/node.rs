//! Node structure for the model graph.

use mml_core::{ContainerClass, NodeId, NodeKind};

/// Extra state carried by shared parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedInfo {
    /// Containers under which same-named parameters are shared. `None` until
    /// the parameter is fully attached.
    pub container_class: Option<ContainerClass>,
    /// Re-entrancy guard set while a propagated write is in progress.
    pub suppressing: bool,
}

impl SharedInfo {
    pub fn new(container_class: ContainerClass) -> Self {
        Self {
            container_class: Some(container_class),
            suppressing: false,
        }
    }
}

/// A named object in the model.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier for this node.
    pub id: NodeId,
    /// Name, unique among siblings.
    pub name: String,
    /// Structural kind.
    pub kind: NodeKind,
    /// Class name as written in MML.
    pub class_name: String,
    /// Back-reference to the containing node.
    pub container: Option<NodeId>,
    /// Contained nodes in insertion order.
    pub children: Vec<NodeId>,
    /// Expression of an attribute.
    pub value: Option<String>,
    /// Last validated value of an attribute.
    pub token: Option<String>,
    /// Relations linked to this port.
    pub links: Vec<NodeId>,
    /// Class this node was instantiated from or extends.
    pub defers_to: Option<NodeId>,
    /// Nodes whose definition is deferred to this one.
    pub deferred_from: Vec<NodeId>,
    /// Present for shared parameters.
    pub shared: Option<SharedInfo>,
    /// Whether the node is written out by the exporter.
    pub persistent: bool,
    /// Write counter: bumped on every value write and rename.
    pub version: u64,
}

impl Node {
    /// Create a new node with no container.
    pub fn new(id: NodeId, kind: NodeKind, name: String, class_name: String) -> Self {
        Self {
            id,
            name,
            kind,
            class_name,
            container: None,
            children: Vec::new(),
            value: None,
            token: None,
            links: Vec::new(),
            defers_to: None,
            deferred_from: Vec::new(),
            shared: None,
            persistent: true,
            version: 1,
        }
    }

    /// Returns true if this node is a shared parameter.
    pub fn is_shared(&self) -> bool {
        self.shared.is_some()
    }

    /// Returns true if other nodes defer their definition to this one.
    pub fn has_deferrals(&self) -> bool {
        !self.deferred_from.is_empty()
    }
}
