//! Snapshots of the variable environment and diffs between them.
//!
//! A [`Snapshot`] holds the value of every non-constant variable. Two
//! snapshots are compared with [`diff`], which yields the [`Changeset`] that
//! drives every invalidation in the kernel.

use serde::{Deserialize, Serialize};

use crate::changeset::Changeset;
use crate::path;
use crate::value::Value;

// =============================================================================
// Snapshot
// =============================================================================

/// Full, deep-comparable serialization of the mutable state.
///
/// Backed by a persistent map so history can hold one per event cheaply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(im::OrdMap<String, Value>);

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this snapshot with `name` bound to `value`.
    #[must_use]
    pub fn with(&self, name: impl Into<String>, value: Value) -> Self {
        Self(self.0.update(name.into(), value))
    }

    /// Returns the value recorded for a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns the number of variables recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no variables are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// =============================================================================
// Diff
// =============================================================================

/// Computes the changeset between two snapshots.
///
/// Every differing variable contributes its name. Differing records and lists
/// contribute `name.field` and `name[i]` paths for the parts that differ, all
/// the way down. When the two sides have different shapes, every path under
/// either side is reported, so a reader of `x.a` is invalidated when `x`
/// changes from an integer to a record.
#[must_use]
pub fn diff(old: &Snapshot, new: &Snapshot) -> Changeset {
    let mut changes = Changeset::empty();
    for (name, old_value) in old.iter() {
        match new.get(name) {
            Some(new_value) => diff_value(name, old_value, new_value, &mut changes),
            None => descendants(name, old_value, &mut changes),
        }
    }
    for (name, new_value) in new.iter() {
        if old.get(name).is_none() {
            descendants(name, new_value, &mut changes);
        }
    }
    changes
}

fn diff_value(path: &str, old: &Value, new: &Value, out: &mut Changeset) {
    if old == new {
        return;
    }
    out.insert(path);
    match (old, new) {
        (Value::Record(left), Value::Record(right)) => {
            for (field, left_value) in left {
                let sub = path::field(path, field);
                match right.get(field) {
                    Some(right_value) => diff_value(&sub, left_value, right_value, out),
                    None => descendants(&sub, left_value, out),
                }
            }
            for (field, right_value) in right {
                if !left.contains_key(field) {
                    descendants(&path::field(path, field), right_value, out);
                }
            }
        }
        (Value::List(left), Value::List(right)) => {
            for i in 0..left.len().max(right.len()) {
                let sub = path::index(path, i);
                match (left.get(i), right.get(i)) {
                    (Some(l), Some(r)) => diff_value(&sub, l, r, out),
                    (Some(only), None) | (None, Some(only)) => descendants(&sub, only, out),
                    (None, None) => {}
                }
            }
        }
        _ => {
            descendants(path, old, out);
            descendants(path, new, out);
        }
    }
}

/// Reports `path` and every path nested under `value`.
fn descendants(path: &str, value: &Value, out: &mut Changeset) {
    out.insert(path);
    match value {
        Value::Record(fields) => {
            for (field, inner) in fields {
                descendants(&path::field(path, field), inner, out);
            }
        }
        Value::List(items) => {
            for (i, inner) in items.iter().enumerate() {
                descendants(&path::index(path, i), inner, out);
            }
        }
        _ => {}
    }
}
