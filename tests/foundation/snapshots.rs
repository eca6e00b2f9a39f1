//! Snapshot and diff tests

use taxiway_foundation::{Changeset, Snapshot, Value, diff};

fn elevator(at: i64, open: bool) -> Value {
    Value::record([("at", Value::Int(at)), ("open", Value::Bool(open))])
}

// =============================================================================
// Diff
// =============================================================================

#[test]
fn diff_descends_into_lists_of_records() {
    let before: Snapshot = [("lifts", Value::list([elevator(1, false), elevator(3, true)]))]
        .into_iter()
        .collect();
    let after: Snapshot = [("lifts", Value::list([elevator(1, true), elevator(3, true)]))]
        .into_iter()
        .collect();
    assert_eq!(
        diff(&before, &after),
        Changeset::from_paths(["lifts", "lifts[0]", "lifts[0].open"])
    );
}

#[test]
fn diff_ignores_untouched_variables() {
    let before: Snapshot = [("a", Value::Int(1)), ("b", Value::Int(2))]
        .into_iter()
        .collect();
    let after = before.with("b", Value::Int(3));
    let changes = diff(&before, &after);
    assert!(changes.contains("b"));
    assert!(!changes.contains("a"));
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn snapshot_survives_msgpack() {
    let snapshot: Snapshot = [
        ("lifts", Value::list([elevator(1, false)])),
        ("name", Value::from("north")),
    ]
    .into_iter()
    .collect();
    let bytes = rmp_serde::to_vec(&snapshot).unwrap();
    let restored: Snapshot = rmp_serde::from_slice(&bytes).unwrap();
    assert!(diff(&snapshot, &restored).is_empty());
}
