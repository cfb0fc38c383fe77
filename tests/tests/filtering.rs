//! Compatibility filtering of loaded documents, end to end.

use std::sync::Arc;

use mml_filter::{default_filters, register_filters, FilterTables};
use mml_parser::{clear_filters, export_moml, registered_filters};
use mml_tests::prelude::*;
use pretty_assertions::assert_eq;

const LEGACY: &str = r#"<entity name="top">
    <entity name="ramp" class="mml.lib.OldRamp">
        <property name="_location" class="mml.Location" value="[10, 20]"/>
    </entity>
    <entity name="s" class="mml.lib.Scale">
        <port name="in"/>
        <port name="out"/>
    </entity>
    <relation name="r"/>
    <link port="s.in" relation="r"/>
    <entity name="plot" class="mml.gui.Plotter"/>
    <property name="note" class="mml.TextAttribute">
        <property name="text" value="hello"/>
    </property>
</entity>"#;

fn load(model: &mut Model) -> NodeId {
    model
        .execute(ChangeRequest::new("load", None, LEGACY))
        .unwrap();
    model.graph().find_root("top").unwrap()
}

#[test]
fn test_legacy_document_modernized() {
    // GIVEN
    let mut model = Model::new();
    model.set_filters(Some(default_filters().unwrap()));

    // WHEN
    let top = load(&mut model);

    // THEN
    let exported = export_moml(model.graph(), top).unwrap();
    assert!(exported.contains(r#"class="mml.lib.Ramp""#));
    assert!(!exported.contains("_location"));
    assert!(!exported.contains("plot"));
    assert!(exported.contains(r#"<port name="input""#));
    assert!(exported.contains(r#"<port name="output""#));
    assert!(exported.contains(r#"<link port="s.input" relation="r"/>"#));
    assert!(model.graph().lookup(top, "note._hideName").is_some());
}

#[test]
fn test_undo_replays_without_filters() {
    // GIVEN - a loaded document and an undoable change in retired vocabulary
    let mut model = Model::new();
    model.set_filters(Some(default_filters().unwrap()));
    let top = load(&mut model);
    let before = model.graph().snapshot(top);

    // WHEN
    model
        .execute(
            ChangeRequest::new("edit", Some(top), r#"<entity name="old" class="mml.lib.OldRamp"/>"#)
                .undoable(true),
        )
        .unwrap();
    let old = model.graph().lookup(top, "old").unwrap();
    assert_eq!(model.graph().get_node(old).unwrap().class_name, "mml.lib.Ramp");
    model.undo(top).unwrap();

    // THEN
    assert_eq!(before, model.graph().snapshot(top));
}

#[test]
fn test_filters_from_json_tables_via_registry() {
    // GIVEN
    let tables = FilterTables::from_json(
        r#"{
            "class_changes": { "mml.lib.OldRamp": "mml.lib.NewRamp" },
            "removed_classes": []
        }"#,
    )
    .unwrap();
    clear_filters();
    register_filters(&tables).unwrap();
    assert_eq!(registered_filters().len(), tables.filters().unwrap().len());
    let mut model = Model::new();

    // WHEN - no explicit list, so the registry applies
    let top = load(&mut model);
    clear_filters();

    // THEN
    let ramp = model.graph().lookup(top, "ramp").unwrap();
    assert_eq!(model.graph().get_node(ramp).unwrap().class_name, "mml.lib.NewRamp");
    assert!(model.graph().lookup(top, "plot").is_some());
}

#[test]
fn test_explicit_empty_filter_list() {
    // GIVEN
    let mut model = Model::new();
    model.set_filters(Some(Vec::<Arc<dyn mml_parser::MomlFilter>>::new()));

    // WHEN
    let top = load(&mut model);

    // THEN
    assert!(model.graph().lookup(top, "s.in").is_some());
    assert!(model.graph().lookup(top, "ramp._location").is_some());
}
