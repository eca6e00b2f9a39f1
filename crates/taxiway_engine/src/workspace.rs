//! The workspace: live state, its history, and the gates that change it.
//!
//! Every mutation goes through [`Workspace::try_change_state`] (commit) or
//! [`Workspace::would_change_state`] (dry run). A commit that changes
//! something records an event, moves the cursor, advances the clock,
//! publishes the changes to rule sets, invariants, and subscribers, and then
//! checks invariants. A dry run always leaves the state where it found it.
//!
//! [`Workspace::set_clock`] and [`Workspace::reset`] move through history
//! without recording anything.

use std::rc::Rc;

use taxiway_foundation::{
    CLOCK, CLOCK_ADVANCED, Changeset, Clock, EXECUTION, Environment, Error, Result, Snapshot,
    Value, diff,
};
use taxiway_history::{BranchId, Cursor, EventId, ExecutionEvent, History};
use tracing::{debug, error, trace};

use crate::config::WorkspaceConfig;
use crate::context::{ExecContext, Observation, OutputBuffer, OutputEntry};
use crate::invariant::{Invariant, InvariantFailure};
use crate::module::{Module, RuleBody, RuleDecl, RuleKind};
use crate::pubsub::Channel;
use crate::rule::{Action, Rule, RuleId, run_action};
use crate::ruleset::RuleSet;

/// Message of the event every history starts with.
pub const INITIAL_MESSAGE: &str = "Initial state";

/// Live state of one running model.
pub struct Workspace {
    config: WorkspaceConfig,
    env: Environment,
    clock: Clock,
    history: History,
    cursor: Cursor,
    declarations: Vec<RuleDecl>,
    rulesets: Vec<RuleSet>,
    invariants: Vec<Invariant>,
    output: OutputBuffer,
    update: Channel<Changeset>,
    forked: Channel<BranchId>,
    post_reset: Channel<Changeset>,
    invariant_error: Channel<InvariantFailure>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("clock", &self.clock)
            .field("cursor", &self.cursor)
            .field("rulesets", &self.rulesets)
            .field("invariants", &self.invariants)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Creates a workspace with the default configuration.
    ///
    /// # Errors
    /// See [`Workspace::with_config`].
    pub fn new(module: Module) -> Result<Self> {
        Self::with_config(module, WorkspaceConfig::default())
    }

    /// Creates a workspace from a compiled module.
    ///
    /// The history starts with one event holding the initial state at clock
    /// 0. Invariants are checked against it, then rule sets are built.
    ///
    /// # Errors
    /// Returns any non-runtime error raised by an invariant, or any error
    /// raised while enumerating a quantified rule's domain.
    pub fn with_config(module: Module, config: WorkspaceConfig) -> Result<Self> {
        let (env, rules, invariants) = module.into_parts();
        let initial = ExecutionEvent::new(
            INITIAL_MESSAGE,
            env.snapshot(),
            0,
            Changeset::everything(),
        );
        let history = History::new(initial);
        let cursor = history.root();

        let mut ws = Self {
            config,
            env,
            clock: 0,
            history,
            cursor,
            declarations: Vec::new(),
            rulesets: Vec::new(),
            invariants: invariants.into_iter().map(Invariant::from).collect(),
            output: OutputBuffer::new(),
            update: Channel::new(),
            forked: Channel::new(),
            post_reset: Channel::new(),
            invariant_error: Channel::new(),
        };
        if ws.config.log_invariant_errors {
            ws.invariant_error.subscribe(|failure: &InvariantFailure| {
                error!(invariant = %failure.invariant, "{}", failure.message);
            });
        }
        if ws.config.check_initial_invariants {
            let passed = ws.check_invariants()?;
            ws.history.set_passed_invariants(cursor.event(), passed)?;
        }

        for decl in &rules {
            let set = match &decl.kind {
                RuleKind::Plain(body) => RuleSet::single(&decl.name, body_action(body)),
                RuleKind::Quantified(body) => {
                    RuleSet::quantified(&decl.name, Rc::clone(body), &ws.env, ws.clock)?
                }
                RuleKind::External(_) => continue,
            };
            ws.rulesets.push(set);
        }
        ws.declarations = rules;
        debug!(
            rulesets = ws.rulesets.len(),
            invariants = ws.invariants.len(),
            "workspace ready"
        );
        Ok(ws)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Returns the current clock.
    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Returns the live variables.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Returns the current value of a variable.
    ///
    /// # Errors
    /// Returns an error if the variable is not declared.
    pub fn value(&self, name: &str) -> Result<&Value> {
        self.env.get(name)
    }

    /// Returns the execution history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Returns the cursor.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Returns the event under the cursor.
    ///
    /// # Errors
    /// Returns an internal error if the cursor has left the history.
    pub fn current_event(&self) -> Result<&ExecutionEvent> {
        self.history.at(&self.cursor)
    }

    /// Returns the rule sets in declaration order.
    #[must_use]
    pub fn rulesets(&self) -> &[RuleSet] {
        &self.rulesets
    }

    /// Returns the invariants in declaration order.
    #[must_use]
    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }

    /// Returns the rule declarations, including external ones.
    #[must_use]
    pub fn declarations(&self) -> &[RuleDecl] {
        &self.declarations
    }

    /// Returns the IDs of every current rule, set by set.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.rulesets
            .iter()
            .enumerate()
            .flat_map(|(set, rs)| {
                let generation = rs.generation();
                (0..rs.rules().len()).map(move |index| RuleId::new(set, generation, index))
            })
            .collect()
    }

    /// Returns a rule by ID.
    ///
    /// # Errors
    /// Returns an internal error if the ID is unknown or its rule set has
    /// been rebuilt since it was issued.
    pub fn rule(&self, id: RuleId) -> Result<&Rule> {
        self.rulesets
            .get(id.set())
            .filter(|rs| rs.generation() == id.generation())
            .and_then(|rs| rs.rules().get(id.index()))
            .ok_or_else(|| stale(id))
    }

    fn rule_mut(&mut self, id: RuleId) -> Result<&mut Rule> {
        self.rulesets
            .get_mut(id.set())
            .filter(|rs| rs.generation() == id.generation())
            .and_then(|rs| rs.rule_mut(id.index()))
            .ok_or_else(|| stale(id))
    }

    /// Takes everything rules have emitted so far.
    pub fn take_output(&mut self) -> Vec<OutputEntry> {
        std::mem::take(&mut self.output)
    }

    // =========================================================================
    // Channels
    // =========================================================================

    /// Changesets published after commits, clock moves, and resets.
    pub fn update_channel(&mut self) -> &mut Channel<Changeset> {
        &mut self.update
    }

    /// New branches created by commits behind a branch tip.
    pub fn fork_channel(&mut self) -> &mut Channel<BranchId> {
        &mut self.forked
    }

    /// Changesets published by [`Workspace::reset`] before the update.
    pub fn post_reset_channel(&mut self) -> &mut Channel<Changeset> {
        &mut self.post_reset
    }

    /// Invariant failures.
    pub fn invariant_error_channel(&mut self) -> &mut Channel<InvariantFailure> {
        &mut self.invariant_error
    }

    // =========================================================================
    // Gates
    // =========================================================================

    /// Runs `mutator` as a committed change.
    ///
    /// The mutator returns a message describing the change. If the state
    /// differs afterwards, an event is recorded with that message, the clock
    /// advances by one, the changes plus `clock` and `execution` are
    /// published, and invariants are checked. If nothing changed, nothing is
    /// recorded or published.
    ///
    /// # Errors
    /// If the mutator fails, the state is restored to what it was and the
    /// error is returned. Once the event is recorded the commit is final:
    /// the changes reach every rule set and subscriber and the invariant
    /// round runs and is recorded before a rule set rebuild error or a
    /// non-runtime invariant error is returned.
    pub fn try_change_state<F>(&mut self, mutator: F) -> Result<Changeset>
    where
        F: FnOnce(&mut Environment, &mut OutputBuffer) -> Result<String>,
    {
        let start = self.cursor;
        let old = self.history.at(&start)?.snapshot().clone();
        let mark = self.output.len();

        let message = match mutator(&mut self.env, &mut self.output) {
            Ok(message) => message,
            Err(err) => {
                self.env.load(&old)?;
                self.output.truncate(mark);
                return Err(err);
            }
        };

        let new = self.env.snapshot();
        let changes = diff(&old, &new);
        if changes.is_empty() {
            return Ok(changes);
        }

        let message = format!("{message} (changed {changes})");
        debug!(clock = self.clock, %message, "commit");
        let event = ExecutionEvent::new(message, new, self.clock, changes.clone());
        self.clock += 1;
        self.cursor = self.history.append(&start, event)?;
        if self.cursor.branch() != start.branch() {
            debug!(branch = %self.cursor.branch(), from = %start.event(), "forked");
            self.forked.publish(&self.cursor.branch());
        }

        let published = self.publish_update(&changes.clone().with([CLOCK, EXECUTION]));
        let checked = self.check_invariants();
        if let Ok(passed) = &checked {
            self.history
                .set_passed_invariants(self.cursor.event(), *passed)?;
        }
        published?;
        checked?;
        Ok(changes)
    }

    /// Runs `mutator` as a dry run and returns what it would change.
    ///
    /// The state is restored afterwards whether or not the mutator
    /// succeeded. Nothing is recorded or published.
    ///
    /// # Errors
    /// Returns the mutator's error, after restoring the state.
    pub fn would_change_state<F>(&mut self, mutator: F) -> Result<Changeset>
    where
        F: FnOnce(&mut Environment) -> Result<()>,
    {
        let old = self.history.at(&self.cursor)?.snapshot().clone();
        let outcome = mutator(&mut self.env);
        let changes = diff(&old, &self.env.snapshot());
        if outcome.is_err() || !changes.is_empty() {
            self.env.load(&old)?;
        }
        outcome.map(|()| changes)
    }

    /// Checks every active invariant in declaration order.
    ///
    /// Stops at the first failure, publishes it on the invariant error
    /// channel, and returns false.
    ///
    /// # Errors
    /// Returns errors other than runtime errors raised by an invariant.
    pub fn check_invariants(&mut self) -> Result<bool> {
        for invariant in &mut self.invariants {
            match invariant.check(&self.env, self.clock) {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => {
                    let failure = InvariantFailure {
                        invariant: invariant.name().to_string(),
                        message: format!("Failed invariant {}: {err}", invariant.name()),
                        error: err,
                    };
                    self.invariant_error.publish(&failure);
                    return Ok(false);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(true)
    }

    /// Delivers `changes` to invariants, then rule sets, then subscribers.
    ///
    /// Delivery always completes; the first rule set error is returned
    /// afterwards.
    fn publish_update(&mut self, changes: &Changeset) -> Result<()> {
        trace!(%changes, "publish");
        for invariant in &mut self.invariants {
            invariant.report_changes(changes);
        }
        let mut first_error = None;
        for set in &mut self.rulesets {
            if let Err(err) = set.report_changes(changes, &self.env, self.clock) {
                first_error.get_or_insert(err);
            }
        }
        self.update.publish(changes);
        first_error.map_or(Ok(()), Err)
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// Fires a rule through the commit gate.
    ///
    /// A rule known to be a no-op returns an empty changeset without running.
    /// Otherwise its action runs with tracking; an empty result is cached as
    /// a no-op together with what was read and the earliest unmet deadline.
    ///
    /// # Errors
    /// Returns an internal error for a stale ID, or any error raised by the
    /// action.
    pub fn fire(&mut self, id: RuleId) -> Result<Changeset> {
        let rule = self.rule(id)?;
        if rule.is_known_no_op() {
            return Ok(Changeset::empty());
        }
        let action = rule.action();
        let name = rule.name().to_string();
        let clock = self.clock;
        let asynchronous = self.config.asynchronous;

        let mut observed = Observation::default();
        let changes = self.try_change_state(|env, output| {
            let mut ctx = ExecContext::new(env)
                .tracking()
                .with_clock(clock)
                .asynchronous(asynchronous)
                .with_output(output);
            let outcome = run_action(&action, &mut ctx);
            observed = ctx.finish();
            outcome.map_err(|e| e.in_frame(format!("rule {name}")))?;
            Ok(name.clone())
        })?;

        // A commit may have rebuilt the rule's set, retiring the ID.
        if let Ok(rule) = self.rule_mut(id) {
            rule.settle_fire(&changes, observed);
        }
        Ok(changes)
    }

    /// Reports what firing a rule would change, through the dry-run gate.
    ///
    /// Answers from the cache when the rule's activity is known.
    ///
    /// # Errors
    /// Returns an internal error for a stale ID, or any error raised by the
    /// action.
    pub fn would_fire(&mut self, id: RuleId) -> Result<Changeset> {
        let rule = self.rule(id)?;
        if let Some(changes) = rule.cached_changes() {
            return Ok(changes);
        }
        let action = rule.action();
        let name = rule.name().to_string();
        let clock = self.clock;
        let asynchronous = self.config.asynchronous;

        let mut observed = Observation::default();
        let changes = self.would_change_state(|env| {
            let mut ctx = ExecContext::new(env)
                .tracking()
                .with_clock(clock)
                .asynchronous(asynchronous);
            let outcome = run_action(&action, &mut ctx);
            observed = ctx.finish();
            outcome.map_err(|e| e.in_frame(format!("rule {name}")))
        })?;
        self.rule_mut(id)?.settle_probe(&changes, observed);
        Ok(changes)
    }

    /// Fires an external rule by name.
    ///
    /// # Errors
    /// Returns an internal error if no external rule has that name, or any
    /// error raised by its body.
    pub fn fire_external(&mut self, name: &str) -> Result<Changeset> {
        let action = self
            .declarations
            .iter()
            .find_map(|decl| match &decl.kind {
                RuleKind::External(body) if decl.name == name => Some(body_action(body)),
                _ => None,
            })
            .ok_or_else(|| Error::internal(format!("no external rule named {name}")))?;
        self.fire_action(name, &action)
    }

    /// Runs an action through the commit gate without touching any cache.
    ///
    /// # Errors
    /// Returns any error raised by the action.
    pub fn fire_action(&mut self, name: &str, action: &Action) -> Result<Changeset> {
        let clock = self.clock;
        let asynchronous = self.config.asynchronous;
        self.try_change_state(|env, output| {
            let mut ctx = ExecContext::new(env)
                .with_clock(clock)
                .asynchronous(asynchronous)
                .with_output(output);
            run_action(action, &mut ctx).map_err(|e| e.in_frame(format!("rule {name}")))?;
            Ok(name.to_string())
        })
    }

    /// Builds a fresh action for every internal rule, expanding quantified
    /// domains against the current state.
    ///
    /// # Errors
    /// Returns any error raised while enumerating a domain.
    pub fn fresh_actions(&self) -> Result<Vec<(String, Action)>> {
        let mut actions = Vec::new();
        for decl in &self.declarations {
            match &decl.kind {
                RuleKind::Plain(body) => actions.push((decl.name.clone(), body_action(body))),
                RuleKind::Quantified(body) => {
                    let set =
                        RuleSet::quantified(&decl.name, Rc::clone(body), &self.env, self.clock)?;
                    actions.extend(
                        set.rules()
                            .iter()
                            .map(|rule| (rule.name().to_string(), rule.action())),
                    );
                }
                RuleKind::External(_) => {}
            }
        }
        Ok(actions)
    }

    // =========================================================================
    // Time Travel
    // =========================================================================

    /// Moves the clock, rounding to the nearest tick.
    ///
    /// # Errors
    /// See [`Workspace::set_tick`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_clock(&mut self, time: f64) -> Result<()> {
        self.set_tick(time.round() as Clock)
    }

    /// Moves the clock to `clock` and the cursor to the latest event on its
    /// branch recorded at or before that time.
    ///
    /// If the cursor stays put only `clock:advanced` is published. If it
    /// moves one step forward, the changes recorded by that step are
    /// published. Otherwise the diff between the two states is published.
    /// `clock` is added whenever the cursor moves.
    ///
    /// # Errors
    /// Returns an internal error if the history is inconsistent, or any
    /// error raised while rebuilding quantified rule sets.
    pub fn set_tick(&mut self, clock: Clock) -> Result<()> {
        let from = self.cursor;
        let branch = from.branch();
        self.clock = clock;
        self.cursor = self
            .history
            .preceding(branch, |event| event.clock() <= clock)
            .unwrap_or_else(|| Cursor::new(EventId::new(0), branch));

        if self.cursor == from {
            trace!(clock, "clock advanced in place");
            return self.publish_update(&Changeset::from_paths([CLOCK_ADVANCED]));
        }

        let old = self.history.at(&from)?.snapshot().clone();
        let target = self.history.at(&self.cursor)?;
        let new = target.snapshot().clone();
        let changes = if self.history.next(&from) == Some(self.cursor) {
            target.changes().clone()
        } else {
            diff(&old, &new)
        }
        .with([CLOCK]);

        debug!(clock, from = %from.event(), to = %self.cursor.event(), "time travel");
        self.env.load(&new)?;
        self.publish_update(&changes)
    }

    /// Moves the clock by `amount` ticks.
    ///
    /// # Errors
    /// See [`Workspace::set_clock`].
    pub fn advance_clock(&mut self, amount: f64) -> Result<()> {
        #[allow(clippy::cast_precision_loss)]
        let now = self.clock as f64;
        self.set_clock(now + amount)
    }

    /// Jumps to an arbitrary cursor and clock.
    ///
    /// Publishes the diff plus `clock` first on the post-reset channel and
    /// then as an update.
    ///
    /// # Errors
    /// Returns an internal error if the cursor's event is not on its branch.
    pub fn reset(&mut self, cursor: Cursor, clock: Clock) -> Result<()> {
        if !self.history.contains(&cursor) {
            return Err(Error::internal(format!(
                "cannot reset to {} on {}",
                cursor.event(),
                cursor.branch()
            )));
        }
        let old: Snapshot = self.history.at(&self.cursor)?.snapshot().clone();
        let new = self.history.at(&cursor)?.snapshot().clone();
        let changes = diff(&old, &new).with([CLOCK]);

        debug!(clock, to = %cursor.event(), branch = %cursor.branch(), "reset");
        self.env.load(&new)?;
        self.cursor = cursor;
        self.clock = clock;
        self.post_reset.publish(&changes);
        self.publish_update(&changes)
    }
}

fn body_action(body: &Rc<dyn RuleBody>) -> Action {
    let body = Rc::clone(body);
    Rc::new(move |ctx: &mut ExecContext<'_>| body.fire(ctx))
}

fn stale(id: RuleId) -> Error {
    Error::internal(format!("rule {id} does not exist in this workspace"))
}
