//! Named safety properties checked after every committed change.
//!
//! An invariant that held is remembered as inactive together with what it
//! read, and is not re-checked until a change lands on one of those paths.

use std::fmt;
use std::rc::Rc;

use taxiway_foundation::{Changeset, Clock, Environment, Error, Readset, Result};

use crate::context::ExecContext;
use crate::module::{InvariantBody, InvariantDecl};

/// Whether an invariant needs checking.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum InvariantStatus {
    /// Must be checked on the next round.
    #[default]
    Active,
    /// Held last time; stays quiet until a change hits `readset`.
    Inactive {
        /// Paths read by the passing check.
        readset: Readset,
    },
}

/// Payload published when an invariant fails.
#[derive(Debug)]
pub struct InvariantFailure {
    /// Name of the failed invariant.
    pub invariant: String,
    /// `Failed invariant NAME: reason`.
    pub message: String,
    /// The runtime error the check raised.
    pub error: Error,
}

/// A declared invariant and its check cache.
pub struct Invariant {
    name: String,
    body: Rc<dyn InvariantBody>,
    status: InvariantStatus,
}

impl fmt::Debug for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invariant")
            .field("name", &self.name)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl From<InvariantDecl> for Invariant {
    fn from(decl: InvariantDecl) -> Self {
        Self::new(decl.name, decl.body)
    }
}

impl Invariant {
    /// Creates an active invariant.
    #[must_use]
    pub fn new(name: impl Into<String>, body: Rc<dyn InvariantBody>) -> Self {
        Self {
            name: name.into(),
            body,
            status: InvariantStatus::Active,
        }
    }

    /// Returns the invariant's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the check cache.
    #[must_use]
    pub fn status(&self) -> &InvariantStatus {
        &self.status
    }

    /// Returns true if the next round must check this invariant.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == InvariantStatus::Active
    }

    /// Checks the invariant if it is active.
    ///
    /// # Errors
    /// A runtime error means the invariant failed and it stays active. Other
    /// errors are faults in the body, including any attempt to write.
    pub fn check(&mut self, env: &Environment, clock: Clock) -> Result<()> {
        if !self.is_active() {
            return Ok(());
        }
        let mut ctx = ExecContext::read_only(env).tracking().with_clock(clock);
        match self.body.check(&mut ctx) {
            Ok(()) => {}
            Err(err) if err.is_early_return() => {}
            Err(err) => return Err(err),
        }
        self.status = InvariantStatus::Inactive {
            readset: ctx.finish().readset,
        };
        Ok(())
    }

    /// Reactivates the invariant if `changes` touch what it read.
    pub fn report_changes(&mut self, changes: &Changeset) {
        if let InvariantStatus::Inactive { readset } = &self.status {
            if changes.affects(readset) {
                self.status = InvariantStatus::Active;
            }
        }
    }
}
