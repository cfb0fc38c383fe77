//! Shared parameters kept consistent through change requests.

use mml_tests::prelude::*;
use pretty_assertions::assert_eq;

const BODY: &str = r#"
    <entity name="a" class="Filter">
        <property name="rate" class="mml.SharedParameter" value="1"/>
    </entity>
    <entity name="group">
        <entity name="b" class="Filter">
            <property name="rate" class="mml.SharedParameter" value="1"/>
        </entity>
        <entity name="c" class="Filter">
            <property name="rate" class="mml.SharedParameter" value="1"/>
        </entity>
    </entity>
    <entity name="d" class="Source">
        <property name="rate" class="mml.SharedParameter" value="5"/>
    </entity>
"#;

#[test]
fn test_shared_parameters_converge() {
    // GIVEN
    let mut bench = Workbench::new(BODY);
    let versions: Vec<u64> = ["a.rate", "group.b.rate", "group.c.rate"]
        .iter()
        .map(|p| bench.version(p))
        .collect();

    // WHEN
    bench.change_in(".top.group.c", r#"<property name="rate" value="7"/>"#, false);

    // THEN - every sibling holds the value, each written exactly once
    for (path, version) in ["a.rate", "group.b.rate", "group.c.rate"].iter().zip(versions) {
        assert_eq!(bench.value(path).as_deref(), Some("7"), "{path}");
        assert_eq!(bench.version(path), version + 1, "{path}");
    }

    // AND - a parameter under another container class is untouched
    assert_eq!(bench.value("d.rate").as_deref(), Some("5"));
}

#[test]
fn test_shared_parameter_undo_restores_all_siblings() {
    // GIVEN
    let mut bench = Workbench::new(BODY);
    bench.change_in(".top.a", r#"<property name="rate" value="4"/>"#, false);
    assert_eq!(bench.value("group.b.rate").as_deref(), Some("4"));

    // WHEN
    bench.undo();

    // THEN
    for path in ["a.rate", "group.b.rate", "group.c.rate"] {
        assert_eq!(bench.value(path).as_deref(), Some("1"), "{path}");
    }
}

#[test]
fn test_library_parameters_are_excluded() {
    // GIVEN - a library holding a parameter of the same shape
    let mut bench = Workbench::new(&format!(
        r#"{BODY}
        <entity name="lib">
            <property name="_libraryMarker" class="mml.LibraryMarker"/>
            <entity name="e" class="Filter">
                <property name="rate" class="mml.SharedParameter" value="3"/>
            </entity>
        </entity>"#
    ));
    let library_version = bench.version("lib.e.rate");

    // WHEN - changed outside the library
    bench.change_in(".top.a", r#"<property name="rate" value="9"/>"#, false);

    // THEN
    assert_eq!(bench.value("group.b.rate").as_deref(), Some("9"));
    assert_eq!(bench.value("lib.e.rate").as_deref(), Some("3"));
    assert_eq!(bench.version("lib.e.rate"), library_version);

    // WHEN - changed inside the library
    bench.change_in(".top.lib.e", r#"<property name="rate" value="6"/>"#, false);

    // THEN
    assert_eq!(bench.value("lib.e.rate").as_deref(), Some("6"));
    assert_eq!(bench.value("a.rate").as_deref(), Some("9"));
}

#[test]
fn test_undo_of_new_shared_parameter_restores_siblings() {
    // GIVEN - one shared parameter and a container of the same class without it
    let mut bench = Workbench::new(
        r#"
        <entity name="a" class="Filter">
            <property name="rate" class="mml.SharedParameter" value="3"/>
        </entity>
        <entity name="b" class="Filter"/>
        "#,
    );
    let before = bench.snapshot();

    // WHEN - a second parameter is created with a different value
    bench.change_in(
        ".top.b",
        r#"<property name="rate" class="mml.SharedParameter" value="9"/>"#,
        false,
    );
    assert_eq!(bench.value("a.rate").as_deref(), Some("9"));
    bench.undo();

    // THEN - the sibling holds its old value and the new parameter is gone
    assert_eq!(bench.value("a.rate").as_deref(), Some("3"));
    assert!(!bench.exists("b.rate"));
    assert_eq!(before, bench.snapshot());

    // AND - redo recreates it with the propagated value
    bench.redo();
    assert_eq!(bench.value("b.rate").as_deref(), Some("9"));
    assert_eq!(bench.value("a.rate").as_deref(), Some("9"));
}
