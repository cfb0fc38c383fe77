//! Serializing graph nodes back to MML.

use mml_core::{GraphError, NodeId, NodeKind};
use mml_graph::Graph;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::{ParseError, ParseResult};

/// Serialize `node` and its persistent subtree, with the links internal to it.
pub fn export_moml(graph: &Graph, node: NodeId) -> ParseResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    write_node(&mut writer, graph, node)?;
    into_string(writer)
}

/// Serialize `node` as a standalone document with an XML declaration.
pub fn export_document(graph: &Graph, node: NodeId) -> ParseResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_node(&mut writer, graph, node)?;
    let mut text = into_string(writer)?;
    text.push('\n');
    Ok(text)
}

/// `<element a="..."/>` with escaped attribute values.
pub fn empty_element(element: &str, attributes: &[(&str, &str)]) -> String {
    let mut out = open_tag(element, attributes);
    out.push_str("/>");
    out
}

/// `<element a="...">body</element>`. `body` is inserted verbatim.
pub fn wrap_element(element: &str, attributes: &[(&str, &str)], body: &str) -> String {
    let mut out = open_tag(element, attributes);
    out.push('>');
    out.push_str(body);
    out.push_str("</");
    out.push_str(element);
    out.push('>');
    out
}

fn open_tag(element: &str, attributes: &[(&str, &str)]) -> String {
    let mut out = format!("<{}", element);
    for (key, value) in attributes {
        out.push_str(&format!(" {}=\"{}\"", key, escape(*value)));
    }
    out
}

fn write_node(writer: &mut Writer<Vec<u8>>, graph: &Graph, id: NodeId) -> ParseResult<()> {
    let node = graph.get_node(id).ok_or(GraphError::NodeNotFound(id))?;
    let element = node.kind.element_name();

    let mut start = BytesStart::new(element);
    start.push_attribute(("name", node.name.as_str()));
    let class_key = if node.kind == NodeKind::Class {
        "extends"
    } else {
        "class"
    };
    start.push_attribute((class_key, node.class_name.as_str()));
    if let Some(value) = &node.value {
        start.push_attribute(("value", value.as_str()));
    }
    if let Some(container_class) = node.shared.as_ref().and_then(|s| s.container_class.as_ref()) {
        let implied = graph
            .container(id)
            .and_then(|c| graph.get_node(c))
            .is_some_and(|c| container_class.to_string() == c.class_name);
        if !implied {
            start.push_attribute(("containerClass", container_class.to_string().as_str()));
        }
    }

    let children: Vec<NodeId> = node
        .children
        .iter()
        .copied()
        .filter(|c| graph.get_node(*c).is_some_and(|n| n.persistent))
        .collect();
    let links = internal_links(graph, id);

    if children.is_empty() && links.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in children {
        write_node(writer, graph, child)?;
    }
    for (port, relation) in links {
        let mut link = BytesStart::new("link");
        link.push_attribute(("port", port.as_str()));
        link.push_attribute(("relation", relation.as_str()));
        writer.write_event(Event::Empty(link))?;
    }
    writer.write_event(Event::End(BytesEnd::new(element)))?;
    Ok(())
}

/// Links from ports inside `id` to relations directly contained in `id`,
/// by name relative to `id`.
fn internal_links(graph: &Graph, id: NodeId) -> Vec<(String, String)> {
    let mut links = Vec::new();
    for relation in graph.children(id) {
        let is_relation = graph
            .get_node(*relation)
            .is_some_and(|n| n.kind == NodeKind::Relation && n.persistent);
        if !is_relation {
            continue;
        }
        for port in graph.linked_ports(*relation) {
            if graph.is_within(port, id) {
                links.push((
                    graph.relative_name(port, id),
                    graph.name(*relation).to_string(),
                ));
            }
        }
    }
    links
}

fn into_string(writer: Writer<Vec<u8>>) -> ParseResult<String> {
    String::from_utf8(writer.into_inner()).map_err(|e| ParseError::Utf8(e.utf8_error()))
}
