//! Applies element events to the graph and records their inverse.
//!
//! Every open element has a frame. A frame knows the node that acts as the
//! container for its children and how to express its own inverse once it
//! closes. Child inverses are collected in execution order and emitted in
//! reverse, so replaying an inverse undoes the newest edit first.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use mml_core::{
    ContainerClass, GraphError, NodeId, NodeKind, DEFAULT_ATTRIBUTE_CLASS, DEFAULT_CLASS_CLASS,
    DEFAULT_ENTITY_CLASS, DEFAULT_PORT_CLASS, DEFAULT_RELATION_CLASS, PARAMETER_CLASS,
    SHARED_PARAMETER_CLASS,
};
use mml_graph::Graph;
use tracing::{debug, trace};

use crate::error::{ParseError, ParseResult};
use crate::event::{read_events, MomlEvent};
use crate::filter::{EndElementContext, FilterChain, FilterContext};
use crate::handler::{ErrorAction, ErrorHandler};
use crate::writer::{empty_element, export_moml, wrap_element};

type Attributes = Vec<(String, String)>;

/// How a frame expresses its inverse.
#[derive(Debug)]
enum FrameKind {
    /// `group`, `doc` and `input`: child inverses pass through unchanged.
    Transparent,
    /// An existing node was entered; its inverse re-enters it.
    Enter,
    /// The node was created here; its inverse deletes it. A new shared
    /// parameter whose value overrode the one its siblings held first
    /// restores that value so they revert with it.
    Created { restore: Option<String> },
    /// An existing attribute, with its previous value if this element
    /// changed it.
    Property { old: Option<Option<String>> },
    /// A leaf element whose inverse is known when it is applied.
    Leaf(Option<String>),
}

#[derive(Debug)]
struct Frame {
    element: String,
    node: Option<NodeId>,
    kind: FrameKind,
    inverse: Vec<String>,
}

impl Frame {
    fn new(element: &str, node: Option<NodeId>, kind: FrameKind) -> Self {
        Self {
            element: element.to_string(),
            node,
            kind,
            inverse: Vec::new(),
        }
    }
}

/// A document pulled in by `<input>`, processed right after its frame opens.
struct Included {
    events: Vec<MomlEvent>,
    base: Option<PathBuf>,
}

/// Result of one builder run.
pub(crate) struct BuildResult {
    pub toplevel: Option<NodeId>,
    /// Top-level inverses, newest first.
    pub inverse: Vec<String>,
    pub cancelled: bool,
    pub skipped: usize,
}

pub(crate) struct Builder<'a> {
    graph: &'a mut Graph,
    context: Option<NodeId>,
    chain: FilterChain,
    handler: &'a mut dyn ErrorHandler,
    base: Option<PathBuf>,
    frames: Vec<Frame>,
    skip_depth: usize,
    top_inverse: Vec<String>,
    toplevel: Option<NodeId>,
    cancelled: bool,
    skipped: usize,
}

impl<'a> Builder<'a> {
    pub fn new(
        graph: &'a mut Graph,
        context: Option<NodeId>,
        chain: FilterChain,
        handler: &'a mut dyn ErrorHandler,
        base: Option<PathBuf>,
    ) -> Self {
        Self {
            graph,
            context,
            chain,
            handler,
            base,
            frames: Vec::new(),
            skip_depth: 0,
            top_inverse: Vec::new(),
            toplevel: None,
            cancelled: false,
            skipped: 0,
        }
    }

    /// Apply every event, then close whatever a cancellation left open.
    pub fn build(mut self, events: Vec<MomlEvent>) -> ParseResult<BuildResult> {
        self.run(events)?;
        while !self.frames.is_empty() {
            self.close_frame()?;
        }
        let mut inverse = self.top_inverse;
        inverse.reverse();
        Ok(BuildResult {
            toplevel: self.toplevel,
            inverse,
            cancelled: self.cancelled,
            skipped: self.skipped,
        })
    }

    fn run(&mut self, events: Vec<MomlEvent>) -> ParseResult<()> {
        for event in events {
            if self.cancelled {
                break;
            }
            match event {
                MomlEvent::Start { name, attributes } => self.start(&name, attributes)?,
                MomlEvent::End { name } => self.end(&name)?,
                MomlEvent::Text(_) => {}
            }
        }
        Ok(())
    }

    fn current_container(&self) -> Option<NodeId> {
        self.frames.last().map(|f| f.node).unwrap_or(self.context)
    }

    fn name_in(&self, id: NodeId, anchor: Option<NodeId>) -> String {
        match anchor {
            Some(anchor) => self.graph.relative_name(id, anchor),
            None => self.graph.full_name(id),
        }
    }

    fn resolve(&self, container: Option<NodeId>, name: &str) -> Option<NodeId> {
        match container {
            Some(container) => self.graph.lookup(container, name),
            None => self.graph.lookup_full_name(name),
        }
    }

    fn require(&self, element: &str, container: Option<NodeId>, name: &str) -> ParseResult<NodeId> {
        self.resolve(container, name)
            .ok_or_else(|| ParseError::not_found(element, name))
    }

    // ==================== Start ====================

    fn start(&mut self, element: &str, attributes: Attributes) -> ParseResult<()> {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return Ok(());
        }
        let container = self.current_container();

        let Some(attributes) = self.filter_attributes(element, attributes, container)? else {
            debug!(element, "element dropped by filter");
            self.skip_depth = 1;
            self.skipped += 1;
            return Ok(());
        };

        match self.open_element(element, &attributes, container) {
            Ok((frame, included)) => {
                trace!(element, node = ?frame.node, "opened element");
                self.frames.push(frame);
                if let Some(included) = included {
                    let saved = std::mem::replace(&mut self.base, included.base);
                    let result = self.run(included.events);
                    self.base = saved;
                    result?;
                }
                Ok(())
            }
            Err(ParseError::Filter(error)) => Err(ParseError::Filter(error)),
            Err(error) => {
                let context = container.map(|c| self.graph.full_name(c));
                match self.handler.handle_error(element, context.as_deref(), &error) {
                    ErrorAction::Continue => {
                        self.skip_depth = 1;
                        self.skipped += 1;
                        Ok(())
                    }
                    ErrorAction::Cancel => {
                        debug!(element, %error, "parse cancelled");
                        self.cancelled = true;
                        Ok(())
                    }
                    ErrorAction::Rethrow => Err(error),
                }
            }
        }
    }

    /// Run the attribute filters. `name` is filtered first so filters can
    /// key on it. Returns `None` if the element is dropped.
    fn filter_attributes(
        &mut self,
        element: &str,
        attributes: Attributes,
        container: Option<NodeId>,
    ) -> ParseResult<Option<Attributes>> {
        if self.chain.is_empty() {
            return Ok(Some(attributes));
        }
        let (mut ordered, rest): (Attributes, Attributes) =
            attributes.into_iter().partition(|(key, _)| key == "name");
        ordered.extend(rest);

        let context = FilterContext::new(&*self.graph, container);
        let mut filtered = Vec::with_capacity(ordered.len());
        let mut has_class = false;
        for (key, value) in ordered {
            has_class |= key == "class";
            match self
                .chain
                .filter_attribute_value(&context, element, &key, Some(value))?
            {
                Some(value) => filtered.push((key, value)),
                None => return Ok(None),
            }
        }
        if !has_class && NodeKind::from_element(element).is_some() {
            if let Some(value) = self
                .chain
                .filter_attribute_value(&context, element, "class", None)?
            {
                filtered.push(("class".to_string(), value));
            }
        }
        Ok(Some(filtered))
    }

    fn open_element(
        &mut self,
        element: &str,
        attributes: &[(String, String)],
        container: Option<NodeId>,
    ) -> ParseResult<(Frame, Option<Included>)> {
        let frame = match element {
            "entity" => self.open_entity(element, NodeKind::Entity, attributes, container)?,
            "class" => self.open_entity(element, NodeKind::Class, attributes, container)?,
            "property" => self.open_property(attributes, container)?,
            "port" => self.open_part(
                element,
                NodeKind::Port,
                DEFAULT_PORT_CLASS,
                attributes,
                container,
            )?,
            "relation" => self.open_part(
                element,
                NodeKind::Relation,
                DEFAULT_RELATION_CLASS,
                attributes,
                container,
            )?,
            "link" => self.open_link(element, attributes, container, true)?,
            "unlink" => self.open_link(element, attributes, container, false)?,
            "deleteEntity" | "deleteProperty" | "deletePort" | "deleteRelation" => {
                self.open_delete(element, attributes, container)?
            }
            "rename" => self.open_rename(attributes, container)?,
            "group" | "doc" => Frame::new(element, container, FrameKind::Transparent),
            "input" => {
                let included = self.read_input(attributes)?;
                let frame = Frame::new(element, container, FrameKind::Transparent);
                return Ok((frame, Some(included)));
            }
            _ => return Err(ParseError::unknown_element(element)),
        };
        Ok((frame, None))
    }

    fn open_entity(
        &mut self,
        element: &str,
        kind: NodeKind,
        attributes: &[(String, String)],
        container: Option<NodeId>,
    ) -> ParseResult<Frame> {
        let name = required(element, attributes, "name")?;
        let class_attr = match kind {
            NodeKind::Class => attribute(attributes, "extends").or(attribute(attributes, "class")),
            _ => attribute(attributes, "class"),
        };

        if let Some(existing) = self.resolve(container, name) {
            let actual = self.kind_of(existing)?;
            if !actual.is_entity_like() {
                return Err(GraphError::KindMismatch {
                    name: self.graph.full_name(existing),
                    expected: kind,
                    actual,
                }
                .into());
            }
            self.note_toplevel(existing, container);
            return Ok(Frame::new(element, Some(existing), FrameKind::Enter));
        }
        if name.contains('.') {
            return Err(ParseError::not_found(element, name));
        }

        let default_class = match kind {
            NodeKind::Class => DEFAULT_CLASS_CLASS,
            _ => DEFAULT_ENTITY_CLASS,
        };
        let class_name = class_attr.unwrap_or(default_class);
        let node = match self.graph.find_class(container, class_name) {
            Some(class) => self
                .graph
                .instantiate(class, container, name, kind, class_name)?,
            None => self.graph.create_node(container, kind, name, class_name)?,
        };
        debug!(node = %self.graph.full_name(node), class = class_name, "created {}", element);
        self.note_toplevel(node, container);
        Ok(Frame::new(element, Some(node), FrameKind::Created { restore: None }))
    }

    fn open_property(
        &mut self,
        attributes: &[(String, String)],
        container: Option<NodeId>,
    ) -> ParseResult<Frame> {
        let container =
            container.ok_or_else(|| ParseError::structure("<property> requires a container"))?;
        let name = required("property", attributes, "name")?;
        let value = attribute(attributes, "value");

        if let Some(existing) = self.graph.lookup(container, name) {
            let actual = self.kind_of(existing)?;
            if actual != NodeKind::Attribute {
                return Err(GraphError::KindMismatch {
                    name: self.graph.full_name(existing),
                    expected: NodeKind::Attribute,
                    actual,
                }
                .into());
            }
            let mut old = None;
            if let Some(value) = value {
                let previous = self.graph.value(existing).map(str::to_string);
                if previous.as_deref() != Some(value) {
                    mml_shared::set_expression(self.graph, existing, value)?;
                    old = Some(previous);
                }
                mml_shared::validate(self.graph, existing)?;
            }
            return Ok(Frame::new(
                "property",
                Some(existing),
                FrameKind::Property { old },
            ));
        }
        if name.contains('.') {
            return Err(ParseError::not_found("property", name));
        }

        let class_name = attribute(attributes, "class").unwrap_or(if value.is_some() {
            PARAMETER_CLASS
        } else {
            DEFAULT_ATTRIBUTE_CLASS
        });
        let node = self
            .graph
            .create_node(Some(container), NodeKind::Attribute, name, class_name)?;
        let mut inferred = None;
        if class_name == SHARED_PARAMETER_CLASS {
            let container_class = attribute(attributes, "containerClass").map(ContainerClass::parse);
            mml_shared::attach(self.graph, node, container_class, None)?;
            inferred = self.graph.value(node).map(str::to_string);
        }
        if let Some(value) = value {
            mml_shared::set_expression(self.graph, node, value)?;
        }
        mml_shared::validate(self.graph, node)?;
        let restore = inferred.filter(|previous| Some(previous.as_str()) != value);
        Ok(Frame::new("property", Some(node), FrameKind::Created { restore }))
    }

    /// Ports and relations.
    fn open_part(
        &mut self,
        element: &str,
        kind: NodeKind,
        default_class: &str,
        attributes: &[(String, String)],
        container: Option<NodeId>,
    ) -> ParseResult<Frame> {
        let container = container
            .ok_or_else(|| ParseError::structure(format!("<{}> requires a container", element)))?;
        let name = required(element, attributes, "name")?;

        if let Some(existing) = self.graph.lookup(container, name) {
            let actual = self.kind_of(existing)?;
            if actual != kind {
                return Err(GraphError::KindMismatch {
                    name: self.graph.full_name(existing),
                    expected: kind,
                    actual,
                }
                .into());
            }
            return Ok(Frame::new(element, Some(existing), FrameKind::Enter));
        }
        if name.contains('.') {
            return Err(ParseError::not_found(element, name));
        }
        let class_name = attribute(attributes, "class").unwrap_or(default_class);
        let node = self
            .graph
            .create_node(Some(container), kind, name, class_name)?;
        Ok(Frame::new(element, Some(node), FrameKind::Created { restore: None }))
    }

    fn open_link(
        &mut self,
        element: &str,
        attributes: &[(String, String)],
        container: Option<NodeId>,
        link: bool,
    ) -> ParseResult<Frame> {
        let port = self.require(element, container, required(element, attributes, "port")?)?;
        let relation = self.require(
            element,
            container,
            required(element, attributes, "relation")?,
        )?;

        let changed = if link {
            self.graph.link(port, relation)?
        } else {
            self.graph.unlink(port, relation)?
        };
        let inverse = changed.then(|| {
            let port_name = self.name_in(port, container);
            let relation_name = self.name_in(relation, container);
            let inverse_element = if link { "unlink" } else { "link" };
            empty_element(
                inverse_element,
                &[("port", port_name.as_str()), ("relation", relation_name.as_str())],
            )
        });
        Ok(Frame::new(element, container, FrameKind::Leaf(inverse)))
    }

    fn open_delete(
        &mut self,
        element: &str,
        attributes: &[(String, String)],
        container: Option<NodeId>,
    ) -> ParseResult<Frame> {
        let name = required(element, attributes, "name")?;
        let node = self.require(element, container, name)?;
        let actual = self.kind_of(node)?;
        let expected = NodeKind::from_delete_element(element)
            .ok_or_else(|| ParseError::unknown_element(element))?;
        let matches = match expected {
            NodeKind::Entity => actual.is_entity_like(),
            other => actual == other,
        };
        if !matches {
            return Err(GraphError::KindMismatch {
                name: self.graph.full_name(node),
                expected,
                actual,
            }
            .into());
        }

        let inverse = self.deletion_inverse(node, container)?;
        self.graph.delete_node(node)?;
        debug!(element, name, "deleted");
        Ok(Frame::new(element, container, FrameKind::Leaf(Some(inverse))))
    }

    /// MML that recreates `node` in `anchor`: its export, wrapped in the
    /// containers between the two, plus links that cross the subtree boundary.
    fn deletion_inverse(&self, node: NodeId, anchor: Option<NodeId>) -> ParseResult<String> {
        let mut text = export_moml(self.graph, node)?;

        let path: Vec<NodeId> = self
            .graph
            .ancestors(node)
            .take_while(|a| Some(*a) != anchor)
            .collect();
        let reaches_anchor = anchor.is_none() || path.len() < self.graph.ancestors(node).count();
        for (index, ancestor) in path.iter().enumerate() {
            let outermost = index + 1 == path.len();
            let name = if outermost && !reaches_anchor {
                self.graph.full_name(*ancestor)
            } else {
                self.graph.name(*ancestor).to_string()
            };
            let element = self.kind_of(*ancestor)?.element_name();
            text = wrap_element(element, &[("name", name.as_str())], &text);
        }

        let mut members = vec![node];
        members.extend(self.graph.descendants(node));
        let subtree: HashSet<NodeId> = members.iter().copied().collect();
        for member in &members {
            match self.kind_of(*member)? {
                NodeKind::Port => {
                    for relation in self.graph.linked_relations(*member) {
                        if !subtree.contains(relation) {
                            text.push_str(&self.link_element(*member, *relation, anchor));
                        }
                    }
                }
                NodeKind::Relation => {
                    for port in self.graph.linked_ports(*member) {
                        if !subtree.contains(&port) {
                            text.push_str(&self.link_element(port, *member, anchor));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(text)
    }

    fn link_element(&self, port: NodeId, relation: NodeId, anchor: Option<NodeId>) -> String {
        let port_name = self.name_in(port, anchor);
        let relation_name = self.name_in(relation, anchor);
        empty_element("link", &[("port", port_name.as_str()), ("relation", relation_name.as_str())])
    }

    fn open_rename(
        &mut self,
        attributes: &[(String, String)],
        container: Option<NodeId>,
    ) -> ParseResult<Frame> {
        let target =
            container.ok_or_else(|| ParseError::structure("<rename> requires an enclosing element"))?;
        let new_name = required("rename", attributes, "name")?;
        let old = self.graph.rename(target, new_name)?;
        let inverse = (old != new_name).then(|| empty_element("rename", &[("name", old.as_str())]));
        Ok(Frame::new("rename", container, FrameKind::Leaf(inverse)))
    }

    fn read_input(&self, attributes: &[(String, String)]) -> ParseResult<Included> {
        let source = required("input", attributes, "source")?;
        let path = match &self.base {
            Some(base) => base.join(source),
            None => PathBuf::from(source),
        };
        debug!(path = %path.display(), "reading input");
        let text = std::fs::read_to_string(&path)?;
        Ok(Included {
            events: read_events(&text)?,
            base: path.parent().map(Path::to_path_buf),
        })
    }

    fn kind_of(&self, id: NodeId) -> ParseResult<NodeKind> {
        Ok(self
            .graph
            .get_node(id)
            .ok_or(GraphError::NodeNotFound(id))?
            .kind)
    }

    fn note_toplevel(&mut self, node: NodeId, container: Option<NodeId>) {
        if container.is_none() && self.toplevel.is_none() {
            self.toplevel = Some(node);
        }
    }

    // ==================== End ====================

    fn end(&mut self, element: &str) -> ParseResult<()> {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return Ok(());
        }
        let Some(frame) = self.frames.last() else {
            return Err(ParseError::structure(format!("unexpected </{}>", element)));
        };
        let container = frame.node;

        if !self.chain.is_empty() {
            let mut context = EndElementContext::new(&mut *self.graph, container, element);
            let filtered = self.chain.filter_end_element(&mut context, element)?;
            if filtered.as_deref() != Some(element) {
                trace!(element, filtered = ?filtered, "end element rewritten");
            }
            let injected = context.into_inverse();
            if let Some(frame) = self.frames.last_mut() {
                frame.inverse.extend(injected);
            }
        }
        self.close_frame()
    }

    fn close_frame(&mut self) -> ParseResult<()> {
        let Some(frame) = self.frames.pop() else {
            return Ok(());
        };
        let parent = self.current_container();

        let mut children = frame.inverse;
        children.reverse();
        let body = children.concat();

        let inverse: Vec<String> = match frame.kind {
            FrameKind::Transparent => {
                // Still in execution order for the parent to reverse.
                children.reverse();
                children
            }
            FrameKind::Leaf(inverse) => inverse.into_iter().collect(),
            FrameKind::Created { restore } => match frame.node.filter(|n| self.graph.contains(*n)) {
                Some(node) => {
                    let element = self.kind_of(node)?.delete_element_name();
                    let name = self.name_in(node, parent);
                    let delete = empty_element(element, &[("name", name.as_str())]);
                    match restore {
                        Some(previous) => {
                            let restore = empty_element(
                                "property",
                                &[("name", name.as_str()), ("value", previous.as_str())],
                            );
                            vec![format!("{restore}{delete}")]
                        }
                        None => vec![delete],
                    }
                }
                None => Vec::new(),
            },
            FrameKind::Enter => match frame.node.filter(|n| self.graph.contains(*n)) {
                Some(node) if !body.is_empty() => {
                    let element = self.kind_of(node)?.element_name();
                    let name = self.name_in(node, parent);
                    vec![wrap_element(element, &[("name", name.as_str())], &body)]
                }
                _ => Vec::new(),
            },
            FrameKind::Property { old } => match frame.node.filter(|n| self.graph.contains(*n)) {
                Some(node) if old.is_some() || !body.is_empty() => {
                    let name = self.name_in(node, parent);
                    let old_value = old.map(|v| v.unwrap_or_default());
                    let mut attributes: Vec<(&str, &str)> = vec![("name", name.as_str())];
                    if let Some(value) = old_value.as_deref() {
                        attributes.push(("value", value));
                    }
                    if body.is_empty() {
                        vec![empty_element("property", &attributes)]
                    } else {
                        vec![wrap_element("property", &attributes, &body)]
                    }
                }
                _ => Vec::new(),
            },
        };

        trace!(element = %frame.element, inverses = inverse.len(), "closed element");
        match self.frames.last_mut() {
            Some(parent_frame) => parent_frame.inverse.extend(inverse),
            None => self.top_inverse.extend(inverse),
        }
        Ok(())
    }
}

fn attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn required<'a>(
    element: &str,
    attributes: &'a [(String, String)],
    key: &str,
) -> ParseResult<&'a str> {
    attribute(attributes, key).ok_or_else(|| ParseError::missing_attribute(element, key))
}
