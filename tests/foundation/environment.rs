//! Environment tests

use taxiway_foundation::{Environment, ErrorKind, Snapshot, Value};

#[test]
fn snapshot_skips_constants() {
    let env = Environment::new()
        .with_var("x", Value::Int(1)).unwrap()
        .with_constant("floors", Value::Int(5)).unwrap();
    let snapshot = env.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get("x"), Some(&Value::Int(1)));
}

#[test]
fn load_restores_values() {
    let mut env = Environment::new().with_var("x", Value::Int(1)).unwrap();
    let saved = env.snapshot();
    env.set("x", Value::Int(9)).unwrap();
    env.load(&saved).unwrap();
    assert_eq!(env.get("x").unwrap(), &Value::Int(1));
}

#[test]
fn load_rejects_incomplete_snapshot() {
    let mut env = Environment::new()
        .with_var("x", Value::Int(1)).unwrap()
        .with_var("y", Value::Int(2)).unwrap();
    let partial: Snapshot = [("x", Value::Int(5))].into_iter().collect();
    let err = env.load(&partial).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingSnapshotEntry(_)));
    assert_eq!(env.get("x").unwrap(), &Value::Int(1));
}

#[test]
fn constants_refuse_assignment() {
    let mut env = Environment::new().with_constant("floors", Value::Int(5)).unwrap();
    let err = env.set("floors", Value::Int(6)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ConstantAssignment(_)));
}
