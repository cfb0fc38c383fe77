//! Changes to class definitions replicated to their instances.

use mml_tests::prelude::*;
use pretty_assertions::assert_eq;

const BODY: &str = r#"
    <class name="Gain" extends="mml.Entity">
        <property name="factor" value="1"/>
        <port name="in"/>
    </class>
    <entity name="g1" class="Gain"/>
    <entity name="g2" class="Gain"/>
"#;

#[test]
fn test_instances_follow_class_and_class_undo() {
    // GIVEN
    let mut bench = Workbench::new(BODY);
    assert_eq!(bench.value("g1.factor").as_deref(), Some("1"));
    let before = bench.snapshot();

    // WHEN
    bench.change_in(
        ".top.Gain",
        r#"<group>
            <property name="factor" value="2"/>
            <port name="out"/>
        </group>"#,
        false,
    );

    // THEN - both instances received the change
    for instance in ["g1", "g2"] {
        assert_eq!(bench.value(&format!("{instance}.factor")).as_deref(), Some("2"));
        assert!(bench.exists(&format!("{instance}.out")));
    }
    // AND - only the class change is on the undo stack
    assert_eq!(bench.undo_len(), 1);

    // WHEN
    bench.undo();

    // THEN - the undo propagates too
    assert_eq!(before, bench.snapshot());
    for instance in ["g1", "g2"] {
        assert_eq!(bench.value(&format!("{instance}.factor")).as_deref(), Some("1"));
        assert!(!bench.exists(&format!("{instance}.out")));
    }
}

#[test]
fn test_redo_propagates() {
    // GIVEN
    let mut bench = Workbench::new(BODY);
    bench.change_in(".top.Gain", r#"<property name="factor" value="5"/>"#, false);
    bench.undo();

    // WHEN
    bench.redo();

    // THEN
    assert_eq!(bench.value("Gain.factor").as_deref(), Some("5"));
    assert_eq!(bench.value("g1.factor").as_deref(), Some("5"));
    assert_eq!(bench.value("g2.factor").as_deref(), Some("5"));
}

#[test]
fn test_replicas_reported_after_primary() {
    // GIVEN
    let mut bench = Workbench::new(BODY);
    let before = bench.listener.events().len();

    // WHEN
    bench.change_in(".top.Gain", r#"<property name="factor" value="3"/>"#, false);

    // THEN - the primary and one replica per instance
    let events = bench.listener.events();
    assert_eq!(events.len(), before + 3);
    assert!(events.iter().all(|(_, error)| error.is_none()));
}

#[test]
fn test_deferred_to_parent() {
    // GIVEN
    let bench = Workbench::new(BODY);
    let factor = bench.node(".top.Gain.factor");
    let class = bench.node(".top.Gain");
    let instance = bench.node(".top.g1");

    // WHEN/THEN
    assert_eq!(bench.model.get_deferred_to_parent(factor), Some(class));
    assert_eq!(bench.model.get_deferred_to_parent(instance), None);
}

#[test]
fn test_instance_change_does_not_reach_class() {
    // GIVEN
    let mut bench = Workbench::new(BODY);

    // WHEN
    bench.change_in(".top.g1", r#"<property name="factor" value="8"/>"#, false);

    // THEN
    assert_eq!(bench.value("g1.factor").as_deref(), Some("8"));
    assert_eq!(bench.value("Gain.factor").as_deref(), Some("1"));
    assert_eq!(bench.value("g2.factor").as_deref(), Some("1"));
}
