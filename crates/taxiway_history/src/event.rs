//! Committed execution events.

use std::fmt;

use taxiway_foundation::{Changeset, Clock, Snapshot};

/// Immutable record of one committed state.
#[derive(Clone, Debug)]
pub struct ExecutionEvent {
    /// Human-readable description of what produced this state.
    message: String,
    /// The full state after the commit.
    snapshot: Snapshot,
    /// Logical clock at which the commit happened.
    clock: Clock,
    /// What changed relative to the parent event.
    changes: Changeset,
    /// Outcome of the invariant round run right after the commit.
    passed_invariants: Option<bool>,
}

impl ExecutionEvent {
    /// Creates a new event whose invariants have not been checked yet.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        snapshot: Snapshot,
        clock: Clock,
        changes: Changeset,
    ) -> Self {
        Self {
            message: message.into(),
            snapshot,
            clock,
            changes,
            passed_invariants: None,
        }
    }

    /// Returns the description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the recorded state.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Returns the logical clock of the commit.
    #[must_use]
    pub const fn clock(&self) -> Clock {
        self.clock
    }

    /// Returns the changeset that produced this event.
    #[must_use]
    pub fn changes(&self) -> &Changeset {
        &self.changes
    }

    /// Returns whether invariants held after this event, if checked.
    #[must_use]
    pub const fn passed_invariants(&self) -> Option<bool> {
        self.passed_invariants
    }

    pub(crate) fn set_passed_invariants(&mut self, passed: bool) {
        self.passed_invariants = Some(passed);
    }
}

impl fmt::Display for ExecutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.passed_invariants {
            Some(true) => "OK",
            Some(false) => "FAILED",
            None => "UNCHECKED",
        };
        write!(f, "[t={}] {} ({status})", self.clock, self.message)
    }
}
