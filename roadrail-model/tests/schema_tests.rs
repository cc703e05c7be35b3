use pretty_assertions::assert_eq;
use roadrail_model::{
    diff, evaluate, reconcile, requires_update, ClassChange, SchemaClass, SchemaDecision,
    SchemaSnapshot, SchemaVersion,
};

fn snapshot(classes: &[(&str, &str)]) -> SchemaSnapshot {
    let mut s = SchemaSnapshot::new("RoadRailDynamic");
    for (name, base) in classes {
        s.add_class(SchemaClass::new(*name, *base));
    }
    s
}

fn persisted(classes: &[(&str, &str)], minor: u32) -> SchemaSnapshot {
    let mut s = snapshot(classes);
    s.version = SchemaVersion {
        read: 1,
        write: 0,
        minor,
    };
    s
}

// ── diff ─────────────────────────────────────────────────────────

#[test]
fn diff_of_identical_snapshots_is_empty() {
    let a = snapshot(&[("A", "Base"), ("B", "Base")]);
    assert!(diff(&a, &a.clone()).is_empty());
}

#[test]
fn diff_reports_added_and_removed_classes() {
    let fresh = snapshot(&[("A", "Base"), ("D", "Base")]);
    let old = snapshot(&[("A", "Base"), ("C", "Base")]);
    let d = diff(&fresh, &old);
    assert_eq!(
        d.changes,
        vec![
            ClassChange::Added("D".to_string()),
            ClassChange::Removed("C".to_string())
        ]
    );
    assert_eq!(d.added().collect::<Vec<_>>(), vec!["D"]);
    assert_eq!(d.removed().collect::<Vec<_>>(), vec!["C"]);
}

#[test]
fn diff_ignores_base_class_changes() {
    let fresh = snapshot(&[("A", "NewBase")]);
    let old = snapshot(&[("A", "OldBase")]);
    assert!(diff(&fresh, &old).is_empty());
}

// ── reconcile ────────────────────────────────────────────────────

#[test]
fn removed_class_is_retained_as_sealed_stub() {
    let old = persisted(&[("A", "Base"), ("B", "Base"), ("C", "CBase")], 3);
    let fresh = snapshot(&[("A", "Base"), ("B", "Base")]);

    let out = reconcile(&fresh, &old);

    let names: Vec<_> = out.classes.keys().cloned().collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    let c = out.class("C").unwrap();
    assert!(c.sealed);
    assert_eq!(c.base_class, "CBase");
    assert_eq!(out.version.minor, 4);
}

#[test]
fn reconcile_does_not_mutate_inputs() {
    let old = persisted(&[("A", "Base"), ("C", "Base")], 0);
    let fresh = snapshot(&[("A", "Base")]);
    let fresh_before = fresh.clone();
    let old_before = old.clone();

    let _ = reconcile(&fresh, &old);

    assert_eq!(fresh, fresh_before);
    assert_eq!(old, old_before);
}

#[test]
fn reconcile_keeps_version_when_nothing_differs() {
    let old = persisted(&[("A", "Base")], 7);
    let fresh = snapshot(&[("A", "Base")]);
    assert_eq!(reconcile(&fresh, &old).version, old.version);
}

// ── evaluate / requires_update ───────────────────────────────────

#[test]
fn no_persisted_schema_always_requires_update() {
    let fresh = snapshot(&[]);
    assert!(requires_update(&fresh, None));
    assert_eq!(evaluate(&fresh, None), SchemaDecision::Publish(fresh.clone()));
}

#[test]
fn identical_snapshot_is_up_to_date() {
    let old = persisted(&[("A", "Base"), ("B", "Base")], 2);
    let fresh = snapshot(&[("A", "Base"), ("B", "Base")]);
    assert!(!requires_update(&fresh, Some(&old)));
    assert_eq!(evaluate(&fresh, Some(&old)), SchemaDecision::UpToDate);
}

#[test]
fn dropped_category_publishes_sealed_stub_with_minor_bump() {
    let old = persisted(&[("A", "Base"), ("B", "Base"), ("C", "CBase")], 0);
    let fresh = snapshot(&[("A", "Base"), ("B", "Base")]);

    assert!(requires_update(&fresh, Some(&old)));
    let SchemaDecision::Publish(out) = evaluate(&fresh, Some(&old)) else {
        panic!("expected a publish decision");
    };
    let names: Vec<_> = out.classes.keys().cloned().collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    let stub = out.class("C").unwrap();
    assert!(stub.sealed);
    assert_eq!(stub.base_class, "CBase");
    assert_eq!(out.version.minor, old.version.minor + 1);

    // Next run against the published schema is a no-op.
    assert!(!requires_update(&fresh, Some(&out)));
}

#[test]
fn reappearing_category_is_unsealed() {
    let mut old = persisted(&[("A", "Base")], 4);
    old.add_class(SchemaClass::sealed_stub(&SchemaClass::new("C", "Base")));
    let fresh = snapshot(&[("A", "Base"), ("C", "Base")]);

    assert_eq!(diff(&fresh, &old).changes, vec![ClassChange::Modifier("C".to_string())]);
    let SchemaDecision::Publish(out) = evaluate(&fresh, Some(&old)) else {
        panic!("expected a publish decision");
    };
    assert!(!out.class("C").unwrap().sealed);
    assert_eq!(out.version.minor, 5);
}

#[test]
fn new_category_alongside_dropped_one_publishes_both() {
    let old = persisted(&[("A", "Base"), ("B", "Base"), ("C", "Base")], 5);
    let fresh = snapshot(&[("A", "Base"), ("B", "Base"), ("D", "Base")]);

    let SchemaDecision::Publish(out) = evaluate(&fresh, Some(&old)) else {
        panic!("expected a publish decision");
    };
    assert!(out.contains("C"));
    assert!(out.class("C").unwrap().sealed);
    assert!(out.contains("D"));
    assert!(!out.class("D").unwrap().sealed);
    assert_eq!(out.version.minor, 6);
}

#[test]
fn stubbed_schema_is_stable_on_next_run() {
    let old = persisted(&[("A", "Base"), ("C", "Base")], 1);
    let fresh = snapshot(&[("A", "Base"), ("D", "Base")]);
    let SchemaDecision::Publish(published) = evaluate(&fresh, Some(&old)) else {
        panic!("expected a publish decision");
    };

    // Same source again: nothing to do.
    assert!(!requires_update(&fresh, Some(&published)));
}

#[test]
fn version_display_is_zero_padded() {
    let v = SchemaVersion {
        read: 1,
        write: 0,
        minor: 12,
    };
    assert_eq!(v.to_string(), "01.00.12");
}

#[test]
fn snapshot_round_trips_through_json() {
    let s = persisted(&[("A", "Base")], 3);
    let json = serde_json::to_string(&s).unwrap();
    let back: SchemaSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, s);
}
