//! Undo and redo through the model's change requests.

use mml_tests::prelude::*;
use pretty_assertions::assert_eq;

const BODY: &str = r#"
    <property name="rate" value="1"/>
    <entity name="a">
        <port name="in"/>
    </entity>
    <relation name="r"/>
    <link port="a.in" relation="r"/>
"#;

#[test]
fn test_undo_redo_round_trip() {
    // GIVEN
    let mut bench = Workbench::new(BODY);
    let before = bench.snapshot();

    // WHEN
    bench.change(
        r#"<group>
            <entity name="b"><port name="out"/></entity>
            <link port="b.out" relation="r"/>
            <entity name="a"><rename name="a2"/></entity>
            <property name="rate" value="9"/>
            <unlink port="a2.in" relation="r"/>
            <deleteRelation name="r"/>
        </group>"#,
    );
    let after = bench.snapshot();
    assert_ne!(before, after);

    // THEN - undo restores the original structure
    bench.undo();
    assert_eq!(before, bench.snapshot());

    // AND - redo brings the change back
    bench.redo();
    assert_eq!(after, bench.snapshot());
}

#[test]
fn test_delete_undo_restores_links() {
    // GIVEN
    let mut bench = Workbench::new(BODY);
    let before = bench.snapshot();

    // WHEN
    bench.change(r#"<deleteEntity name="a"/>"#);
    assert!(!bench.exists("a"));

    // THEN
    bench.undo();
    assert_eq!(before, bench.snapshot());
}

#[test]
fn test_merge_top_two_equals_two_undos() {
    // GIVEN - the same two edits, merged in one bench and separate in the other
    let edits = [
        r#"<property name="rate" value="2"/>"#,
        r#"<entity name="b"><port name="p"/></entity>"#,
    ];
    let mut merged = Workbench::new(BODY);
    let mut separate = Workbench::new(BODY);
    let before = merged.snapshot();

    merged.change(edits[0]);
    merged.change_in(".top", edits[1], true);
    separate.change(edits[0]);
    separate.change(edits[1]);
    assert_eq!(merged.undo_len(), 1);
    assert_eq!(separate.undo_len(), 2);

    // WHEN
    merged.undo();
    separate.undo();
    separate.undo();

    // THEN
    assert_eq!(merged.snapshot(), separate.snapshot());
    assert_eq!(before, merged.snapshot());
}

#[test]
fn test_fresh_change_clears_redo() {
    // GIVEN - an undone change
    let mut bench = Workbench::new(BODY);
    bench.change(r#"<property name="rate" value="2"/>"#);
    bench.undo();
    assert_eq!(bench.redo_len(), 1);

    // WHEN
    bench.change(r#"<property name="rate" value="3"/>"#);

    // THEN
    assert_eq!(bench.redo_len(), 0);
    assert!(bench.model.redo(bench.top).is_none());
    assert_eq!(bench.value("rate").as_deref(), Some("3"));
}

#[test]
fn test_redo_keeps_older_redo_entries() {
    // GIVEN - two undone changes
    let mut bench = Workbench::new(BODY);
    bench.change(r#"<property name="rate" value="2"/>"#);
    bench.change(r#"<property name="rate" value="3"/>"#);
    bench.undo();
    bench.undo();
    assert_eq!(bench.value("rate").as_deref(), Some("1"));

    // WHEN
    bench.redo();

    // THEN
    assert_eq!(bench.value("rate").as_deref(), Some("2"));
    assert_eq!(bench.redo_len(), 1);

    // AND
    bench.redo();
    assert_eq!(bench.value("rate").as_deref(), Some("3"));
    assert_eq!((bench.undo_len(), bench.redo_len()), (2, 0));
}

#[test]
fn test_undo_reports_to_listeners() {
    // GIVEN
    let mut bench = Workbench::new(BODY);
    bench.change(r#"<entity name="b"/>"#);
    let before = bench.listener.executed();

    // WHEN
    bench.undo();

    // THEN
    assert_eq!(bench.listener.executed(), before + 1);
    assert_eq!(bench.listener.failed(), 0);
    assert!(!bench.exists("b"));
}

#[test]
fn test_redo_in_removed_context_does_not_keep_redo_history() {
    // GIVEN - two undone changes, the newest redo entry made in `a`
    let mut bench = Workbench::new(BODY);
    bench.change_in(".top.a", r#"<property name="x" value="5"/>"#, false);
    bench.change(r#"<property name="rate" value="2"/>"#);
    bench.undo();
    bench.undo();
    assert_eq!(bench.redo_len(), 2);

    // AND - `a` removed without recording undo
    let top = bench.top;
    bench
        .model
        .execute(ChangeRequest::new("test", Some(top), r#"<deleteEntity name="a"/>"#))
        .unwrap();

    // WHEN - redo cannot run, then a fresh change is made
    assert!(bench.model.redo(top).is_none());
    bench.change(r#"<property name="rate" value="7"/>"#);

    // THEN - the older redo entry no longer applies
    assert_eq!(bench.redo_len(), 0);
    assert!(bench.model.redo(top).is_none());
    assert_eq!(bench.value("rate").as_deref(), Some("7"));
}

#[test]
fn test_several_changes_undone_and_redone() {
    // GIVEN
    let mut bench = Workbench::new(BODY);
    let before = bench.snapshot();
    let changes = [
        r#"<entity name="b"><port name="out"/><property name="gain" value="2"/></entity>"#,
        r#"<group>
            <link port="b.out" relation="r"/>
            <unlink port="a.in" relation="r"/>
        </group>"#,
        r#"<entity name="a"><rename name="renamed"/></entity>"#,
        r#"<group>
            <property name="rate" value="4"/>
            <deleteEntity name="renamed"/>
        </group>"#,
    ];

    // WHEN
    for change in changes {
        bench.change(change);
    }
    let after = bench.snapshot();
    assert_eq!(bench.undo_len(), changes.len());
    for _ in changes {
        bench.undo();
    }

    // THEN
    assert_eq!(before, bench.snapshot());
    assert_eq!(bench.redo_len(), changes.len());

    // WHEN
    for _ in changes {
        bench.redo();
    }

    // THEN
    assert_eq!(after, bench.snapshot());
    assert_eq!((bench.undo_len(), bench.redo_len()), (changes.len(), 0));
}
