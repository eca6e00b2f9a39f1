//! A fireable rule and its activity cache.
//!
//! Each [`Rule`] remembers what it learned the last time it ran against the
//! current state. A rule known to be a no-op is skipped until a change lands
//! on something it read; a rule known to be effective answers dry-run probes
//! from the cache.
//!
//! ```text
//!                 fire: empty          probe: non-empty
//!  Unevaluated ───────────────▶ NoOp   Unevaluated ──────────▶ Effective
//!       ▲                        │          ▲                      │
//!       └── changes hit readset ─┘          └─ changes hit readset ┘
//! ```

use std::fmt;
use std::rc::Rc;

use taxiway_foundation::{Changeset, Clock, Error, Readset, Result};

use crate::context::{ExecContext, Observation};

/// Executable body of a single rule.
pub type Action = Rc<dyn Fn(&mut ExecContext<'_>) -> Result<()>>;

/// Runs an action, treating an early return as normal completion.
pub(crate) fn run_action(action: &Action, ctx: &mut ExecContext<'_>) -> Result<()> {
    match action(ctx) {
        Err(err) if err.is_early_return() => Ok(()),
        other => other,
    }
}

// =============================================================================
// Rule ID
// =============================================================================

/// Address of a rule inside a workspace.
///
/// Quantified rule sets rebuild their rules when their domain changes; the
/// generation makes IDs from before a rebuild detectably stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId {
    set: usize,
    generation: u64,
    index: usize,
}

impl RuleId {
    pub(crate) const fn new(set: usize, generation: u64, index: usize) -> Self {
        Self {
            set,
            generation,
            index,
        }
    }

    /// Returns the index of the owning rule set.
    #[must_use]
    pub const fn set(&self) -> usize {
        self.set
    }

    /// Returns the generation of the owning rule set when this ID was issued.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the index within the rule set.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.set, self.index, self.generation)
    }
}

// =============================================================================
// Activity
// =============================================================================

/// What a rule knows about itself against the current state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Activity {
    /// Nothing is cached.
    #[default]
    Unevaluated,
    /// Firing would change nothing until a change hits `readset`.
    KnownNoOp {
        /// Paths read on the last run.
        readset: Readset,
        /// Earliest unmet `past(t)` deadline seen on the last run.
        next_wake: Option<Clock>,
    },
    /// Firing would produce `changes` until a change hits `readset`.
    KnownEffective {
        /// Paths read on the last run.
        readset: Readset,
        /// Changes the last dry run produced.
        changes: Changeset,
    },
}

// =============================================================================
// Rule
// =============================================================================

/// A named, fireable rule.
#[derive(Clone)]
pub struct Rule {
    name: String,
    action: Action,
    activity: Activity,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("activity", &self.activity)
            .finish_non_exhaustive()
    }
}

impl Rule {
    /// Creates an unevaluated rule.
    #[must_use]
    pub fn new(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            action,
            activity: Activity::Unevaluated,
        }
    }

    /// Returns the rule's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the cached activity.
    #[must_use]
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Returns a handle to the rule's action.
    #[must_use]
    pub fn action(&self) -> Action {
        Rc::clone(&self.action)
    }

    /// Returns true if the rule is known to be a no-op.
    #[must_use]
    pub fn is_known_no_op(&self) -> bool {
        matches!(self.activity, Activity::KnownNoOp { .. })
    }

    /// Returns the changes a dry run would report, if the cache knows them.
    #[must_use]
    pub fn cached_changes(&self) -> Option<Changeset> {
        match &self.activity {
            Activity::Unevaluated => None,
            Activity::KnownNoOp { .. } => Some(Changeset::empty()),
            Activity::KnownEffective { changes, .. } => Some(changes.clone()),
        }
    }

    /// Returns the wake-up time recorded by the last no-op run.
    ///
    /// `None` means the rule is not waiting on the clock.
    ///
    /// # Errors
    /// Returns an internal error unless the rule is known to be a no-op.
    pub fn next_wake(&self) -> Result<Option<Clock>> {
        match &self.activity {
            Activity::KnownNoOp { next_wake, .. } => Ok(*next_wake),
            _ => Err(Error::internal(format!(
                "next wake of {} asked while not known to be a no-op",
                self.name
            ))),
        }
    }

    /// Records the outcome of a real fire.
    pub(crate) fn settle_fire(&mut self, changes: &Changeset, observed: Observation) {
        self.activity = if changes.is_empty() {
            Activity::KnownNoOp {
                readset: observed.readset,
                next_wake: observed.next_wake,
            }
        } else {
            Activity::Unevaluated
        };
    }

    /// Records the outcome of a dry run.
    pub(crate) fn settle_probe(&mut self, changes: &Changeset, observed: Observation) {
        self.activity = if changes.is_empty() {
            Activity::KnownNoOp {
                readset: observed.readset,
                next_wake: observed.next_wake,
            }
        } else {
            Activity::KnownEffective {
                readset: observed.readset,
                changes: changes.clone(),
            }
        };
    }

    /// Invalidates the cache if `changes` touch what the rule read.
    ///
    /// A no-op rule waiting on the clock is also invalidated once `clock`
    /// reaches its deadline, whatever the changes name.
    pub fn report_changes(&mut self, changes: &Changeset, clock: Clock) {
        let invalidate = match &self.activity {
            Activity::Unevaluated => false,
            Activity::KnownNoOp { readset, next_wake } => {
                changes.affects(readset) || next_wake.is_some_and(|wake| wake <= clock)
            }
            Activity::KnownEffective { readset, .. } => changes.affects(readset),
        };
        if invalidate {
            self.activity = Activity::Unevaluated;
        }
    }
}
