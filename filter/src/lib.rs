//! MML Compatibility Filters
//!
//! Concrete stream filters that let older documents load into the current
//! model:
//! - Class renames (`ClassChanges`)
//! - Dropping retired and rendition-only classes (`RemoveClasses`,
//!   `RemoveGraphicalClasses`)
//! - Port renames with link rewriting (`PortNameChanges`)
//! - Hiding annotation names (`HideAnnotationNames`)
//!
//! Filters are configured from [`FilterTables`], loadable from JSON.

mod class_changes;
mod hide_names;
mod path;
mod port_names;
mod remove;
mod tables;

use std::sync::Arc;

use mml_parser::{register_filter, MomlFilter};

pub use class_changes::ClassChanges;
pub use hide_names::HideAnnotationNames;
pub use port_names::PortNameChanges;
pub use remove::{RemoveClasses, RemoveGraphicalClasses};
pub use tables::{FilterTables, TablesError, TablesResult};

/// The standard filters over the built-in tables.
pub fn default_filters() -> TablesResult<Vec<Arc<dyn MomlFilter>>> {
    FilterTables::default().filters()
}

/// Add every filter built from `tables` to the process-wide registry.
pub fn register_filters(tables: &FilterTables) -> TablesResult<()> {
    for filter in tables.filters()? {
        tracing::debug!(filter = filter.name(), "registering filter");
        register_filter(filter);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mml_graph::{Graph, Snapshot};
    use mml_parser::{FilterChain, FilterContext, MomlParser, ParserConfig};
    use pretty_assertions::assert_eq;

    const LEGACY: &str = r#"<entity name="top">
        <entity name="ramp" class="mml.lib.OldRamp">
            <property name="_location" class="mml.Location" value="[10, 20]"/>
            <property name="step" value="1"/>
        </entity>
        <property name="_icon" class="mml.vergil.BoxIcon"/>
        <entity name="plot" class="mml.gui.Plotter"/>
        <entity name="s" class="mml.lib.Scale">
            <port name="in"/>
        </entity>
        <relation name="r"/>
        <link port="s.in" relation="r"/>
    </entity>"#;

    fn load(filters: Vec<Arc<dyn MomlFilter>>) -> Snapshot {
        let mut graph = Graph::new();
        let mut parser = MomlParser::with_config(ParserConfig::default());
        parser.set_filters(Some(filters));
        let outcome = parser.parse(&mut graph, None, LEGACY).unwrap();
        graph.snapshot(outcome.toplevel.unwrap())
    }

    #[test]
    fn test_default_filters_modernize_document() {
        // GIVEN/WHEN
        let snapshot = load(default_filters().unwrap());

        // THEN
        assert_eq!(snapshot.nodes["ramp"].class_name, "mml.lib.Ramp");
        assert!(!snapshot.nodes.contains_key("ramp._location"));
        assert!(!snapshot.nodes.contains_key("_icon"));
        assert!(!snapshot.nodes.contains_key("plot"));
        assert!(snapshot.nodes.contains_key("s.input"));
        assert!(snapshot
            .links
            .contains(&("s.input".to_string(), "r".to_string())));
    }

    #[test]
    fn test_disjoint_filters_commute() {
        // GIVEN
        let tables = FilterTables::default();
        let renames: Arc<dyn MomlFilter> = Arc::new(ClassChanges::new(tables.class_changes.clone()));
        let graphical: Arc<dyn MomlFilter> =
            Arc::new(RemoveGraphicalClasses::new(&tables.graphical_class_patterns).unwrap());

        // WHEN
        let forward = load(vec![Arc::clone(&renames), Arc::clone(&graphical)]);
        let backward = load(vec![graphical, renames]);

        // THEN
        assert_eq!(forward, backward);
        assert_eq!(forward.nodes["ramp"].class_name, "mml.lib.Ramp");
    }

    #[test]
    fn test_drop_and_unchanged_told_apart_by_input() {
        // GIVEN
        let filters = default_filters().unwrap();
        let mut chain = FilterChain::new(&filters);
        let graph = Graph::new();
        let context = FilterContext::new(&graph, None);

        // WHEN
        let absent = chain
            .filter_attribute_value(&context, "entity", "class", None)
            .unwrap();
        let retired = chain
            .filter_attribute_value(&context, "entity", "class", Some("mml.gui.Plotter".to_string()))
            .unwrap();

        // THEN - same output, different meaning
        assert_eq!(absent, None);
        assert_eq!(retired, None);

        // AND - the builder keeps the first element and drops the second
        let mut graph = Graph::new();
        let mut parser = MomlParser::new();
        parser.set_filters(Some(filters));
        let outcome = parser
            .parse(
                &mut graph,
                None,
                r#"<entity name="top">
                    <entity name="plain"/>
                    <entity name="plot" class="mml.gui.Plotter"/>
                </entity>"#,
            )
            .unwrap();
        let top = outcome.toplevel.unwrap();
        assert!(graph.lookup(top, "plain").is_some());
        assert!(graph.lookup(top, "plot").is_none());
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_passes_are_fresh_per_parse() {
        // GIVEN - a port rename recorded while loading one document
        let mut parser = MomlParser::new();
        parser.set_filters(Some(default_filters().unwrap()));
        let mut graph = Graph::new();
        parser
            .parse(
                &mut graph,
                None,
                r#"<entity name="top">
                    <entity name="s" class="mml.lib.Scale"><port name="in"/></entity>
                </entity>"#,
            )
            .unwrap();

        // WHEN - the next document links a port with the old name
        let mut other = Graph::new();
        let outcome = parser
            .parse(
                &mut other,
                None,
                r#"<entity name="top">
                    <entity name="s"><port name="in"/></entity>
                    <relation name="r"/>
                    <link port="s.in" relation="r"/>
                </entity>"#,
            )
            .unwrap();

        // THEN - the link is not rewritten
        let top = outcome.toplevel.unwrap();
        let port = other.lookup(top, "s.in").unwrap();
        assert_eq!(other.linked_relations(port).len(), 1);
    }
}
