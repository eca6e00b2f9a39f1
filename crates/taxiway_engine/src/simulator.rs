//! Random-order simulation over a workspace.
//!
//! One [`Simulator::step`] fires rules in a shuffled order until one of them
//! changes the state. When every rule is a no-op, the clock jumps to the
//! earliest deadline any of them is waiting on and the pass repeats. With no
//! deadline left the model is deadlocked.
//!
//! [`Simulator::naive_step`] does the same search with fresh actions and no
//! caching, and serves as the reference the reactive step is checked
//! against.

use rand::Rng;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use taxiway_foundation::{Changeset, Clock, Error, Result, SemanticLimit};
use tracing::{debug, info};

use crate::config::SimulatorConfig;
use crate::workspace::Workspace;

/// Result of one step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A rule changed the state.
    Fired {
        /// Name of the rule that fired.
        rule: String,
        /// What it changed.
        changes: Changeset,
    },
    /// No rule can change the state, now or at any future time.
    Deadlock,
}

impl StepOutcome {
    /// Returns true for [`StepOutcome::Deadlock`].
    #[must_use]
    pub const fn is_deadlock(&self) -> bool {
        matches!(self, Self::Deadlock)
    }
}

/// Drives a workspace forward one rule at a time.
#[derive(Debug)]
pub struct Simulator<R = ChaCha8Rng> {
    rng: R,
    config: SimulatorConfig,
}

impl Simulator<ChaCha8Rng> {
    /// Creates a simulator with a `ChaCha8` RNG seeded from `config`.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self { rng, config }
    }
}

impl Default for Simulator<ChaCha8Rng> {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl<R: Rng> Simulator<R> {
    /// Creates a simulator over a caller-supplied RNG.
    pub fn with_rng(rng: R, config: SimulatorConfig) -> Self {
        Self { rng, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Fires rules until one changes the state, advancing the clock as needed.
    ///
    /// # Errors
    /// Returns [`SemanticLimit::MaxPasses`] if the configured pass limit is
    /// reached, or any error raised by a rule or by the workspace.
    pub fn step(&mut self, ws: &mut Workspace) -> Result<StepOutcome> {
        let mut passes = 0;
        loop {
            if let Some(limit) = self.config.max_passes {
                if passes >= limit {
                    return Err(Error::limit_exceeded(SemanticLimit::MaxPasses { limit }));
                }
            }
            passes += 1;

            let mut ids = ws.rule_ids();
            ids.shuffle(&mut self.rng);
            let mut next_wake: Option<Clock> = None;
            for id in ids {
                let name = ws.rule(id)?.name().to_string();
                let changes = ws.fire(id)?;
                if !changes.is_empty() {
                    debug!(rule = %name, %changes, clock = ws.clock(), "fired");
                    return Ok(StepOutcome::Fired {
                        rule: name,
                        changes,
                    });
                }
                if let Some(wake) = ws.rule(id)?.next_wake()? {
                    next_wake = Some(next_wake.map_or(wake, |current| current.min(wake)));
                }
            }

            let Some(wake) = next_wake else {
                info!(clock = ws.clock(), "deadlock");
                return Ok(StepOutcome::Deadlock);
            };
            debug!(from = ws.clock(), to = wake, "all rules idle, advancing clock");
            ws.set_tick(wake)?;
        }
    }

    /// Tries every rule once in random order with fresh actions and no
    /// caching, committing the first that changes the state.
    ///
    /// Never advances the clock.
    ///
    /// # Errors
    /// Returns any error raised by a rule or by the workspace.
    pub fn naive_step(&mut self, ws: &mut Workspace) -> Result<StepOutcome> {
        let mut actions = ws.fresh_actions()?;
        actions.shuffle(&mut self.rng);
        for (name, action) in actions {
            let changes = ws.fire_action(&name, &action)?;
            if !changes.is_empty() {
                debug!(rule = %name, %changes, "fired");
                return Ok(StepOutcome::Fired {
                    rule: name,
                    changes,
                });
            }
        }
        info!(clock = ws.clock(), "deadlock");
        Ok(StepOutcome::Deadlock)
    }

    /// Steps until deadlock or until `max_steps` rules have fired.
    ///
    /// Returns the number of rules fired.
    ///
    /// # Errors
    /// Returns the first error a step raises.
    pub fn run(&mut self, ws: &mut Workspace, max_steps: usize) -> Result<usize> {
        let mut fired = 0;
        while fired < max_steps {
            if self.step(ws)?.is_deadlock() {
                break;
            }
            fired += 1;
        }
        Ok(fired)
    }
}
