//! Node kinds and container-class tags.

use std::fmt;

/// The structural kind of a node in the model.
///
/// Kinds map one-to-one onto the MML elements that create them, and onto
/// the `delete*` elements that remove them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// A component instance (`<entity>`).
    Entity,
    /// A class definition (`<class>`), instantiated by entities that defer to it.
    Class,
    /// A port on an entity (`<port>`).
    Port,
    /// A relation connecting ports (`<relation>`).
    Relation,
    /// An attribute or parameter (`<property>`).
    Attribute,
}

impl NodeKind {
    /// Element name used to create or enter a node of this kind.
    pub fn element_name(&self) -> &'static str {
        match self {
            NodeKind::Entity => "entity",
            NodeKind::Class => "class",
            NodeKind::Port => "port",
            NodeKind::Relation => "relation",
            NodeKind::Attribute => "property",
        }
    }

    /// Element name used to delete a node of this kind.
    pub fn delete_element_name(&self) -> &'static str {
        match self {
            // Classes are deleted with deleteEntity.
            NodeKind::Entity | NodeKind::Class => "deleteEntity",
            NodeKind::Port => "deletePort",
            NodeKind::Relation => "deleteRelation",
            NodeKind::Attribute => "deleteProperty",
        }
    }

    /// Parse the kind from a creating element name.
    pub fn from_element(name: &str) -> Option<Self> {
        match name {
            "entity" => Some(NodeKind::Entity),
            "class" => Some(NodeKind::Class),
            "port" => Some(NodeKind::Port),
            "relation" => Some(NodeKind::Relation),
            "property" => Some(NodeKind::Attribute),
            _ => None,
        }
    }

    /// Parse the kind from a deleting element name.
    pub fn from_delete_element(name: &str) -> Option<Self> {
        match name {
            "deleteEntity" => Some(NodeKind::Entity),
            "deletePort" => Some(NodeKind::Port),
            "deleteRelation" => Some(NodeKind::Relation),
            "deleteProperty" => Some(NodeKind::Attribute),
            _ => None,
        }
    }

    /// Returns true for entities and classes.
    pub fn is_entity_like(&self) -> bool {
        matches!(self, NodeKind::Entity | NodeKind::Class)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// The kind of container under which shared parameters count as "the same".
///
/// This is an explicit tag check rather than a type inspection: a container
/// matches either by structural kind, or by class name (including any class
/// the container defers to).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerClass {
    /// Any container of the given kind.
    Kind(NodeKind),
    /// Containers whose class (or deferred-to class) has this name.
    Named(String),
}

impl ContainerClass {
    /// Create a class-name tag.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Parse the textual form written by `Display`: `kind:<element>` for a
    /// structural kind, anything else as a class name.
    pub fn parse(text: &str) -> Self {
        text.strip_prefix("kind:")
            .and_then(NodeKind::from_element)
            .map(ContainerClass::Kind)
            .unwrap_or_else(|| ContainerClass::named(text))
    }
}

impl fmt::Display for ContainerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerClass::Kind(kind) => write!(f, "kind:{}", kind),
            ContainerClass::Named(name) => f.write_str(name),
        }
    }
}
