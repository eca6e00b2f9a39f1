//! Rules, invariants, the workspace, and the simulator for Taxiway.
//!
//! This crate provides:
//! - [`Module`] - A compiled model: variables, rule and invariant declarations
//! - [`ExecContext`] - The tracked view a body evaluates through
//! - [`Rule`] / [`RuleSet`] - Fireable rules and their activity caches
//! - [`Invariant`] - Safety properties checked after every commit
//! - [`Workspace`] - Live state, history, and the commit and dry-run gates
//! - [`Simulator`] - Random-order stepping with clock advancement
//!
//! # Reactivity
//!
//! Everything a body reads is recorded. Every commit publishes the paths it
//! changed. A rule or invariant is only re-evaluated when a published change
//! touches something it read, or when the clock reaches a deadline it is
//! waiting on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod invariant;
pub mod module;
pub mod pubsub;
pub mod rule;
pub mod ruleset;
pub mod simulator;
pub mod workspace;

pub use config::{SimulatorConfig, WorkspaceConfig};
pub use context::{ExecContext, Observation, OutputBuffer, OutputEntry};
pub use invariant::{Invariant, InvariantFailure, InvariantStatus};
pub use module::{
    ForEach, InvariantBody, InvariantDecl, Module, QuantifiedRuleBody, RuleBody, RuleDecl,
    RuleKind,
};
pub use pubsub::{Channel, SubscriptionId};
pub use rule::{Action, Activity, Rule, RuleId};
pub use ruleset::{MultiRuleSet, RuleSet};
pub use simulator::{Simulator, StepOutcome};
pub use workspace::{INITIAL_MESSAGE, Workspace};
