//! Rule sets: one declared rule, or one rule per element of a domain.
//!
//! A quantified declaration `for i in xs` expands into a rule per index
//! tuple, named `name(i)` or `name(i, j)`. The domain is evaluated with
//! tracking and without write access; when a change lands on what it read,
//! the whole set is rebuilt and every rule in it starts over unevaluated.
//!
//! A rebuild whose enumeration fails leaves the set empty and stale. A stale
//! set retries on every change it is told about until enumeration succeeds.

use std::rc::Rc;

use taxiway_foundation::{Changeset, Clock, Environment, Readset, Result, Value};
use tracing::debug;

use crate::context::ExecContext;
use crate::module::QuantifiedRuleBody;
use crate::rule::{Action, Rule};

// =============================================================================
// RuleSet
// =============================================================================

/// The rules produced by one declaration.
#[derive(Debug)]
pub enum RuleSet {
    /// An unquantified rule.
    Single(Rule),
    /// A quantified rule expanded over its domain.
    Multi(MultiRuleSet),
}

impl RuleSet {
    /// Creates a set holding one rule.
    #[must_use]
    pub fn single(name: impl Into<String>, action: Action) -> Self {
        Self::Single(Rule::new(name, action))
    }

    /// Expands a quantified declaration against the current state.
    ///
    /// # Errors
    /// Returns any error raised while enumerating the domain.
    pub fn quantified(
        name: impl Into<String>,
        body: Rc<dyn QuantifiedRuleBody>,
        env: &Environment,
        clock: Clock,
    ) -> Result<Self> {
        MultiRuleSet::new(name, body, env, clock).map(Self::Multi)
    }

    /// Returns the declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Single(rule) => rule.name(),
            Self::Multi(set) => &set.name,
        }
    }

    /// Returns the rules currently in the set.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        match self {
            Self::Single(rule) => std::slice::from_ref(rule),
            Self::Multi(set) => &set.rules,
        }
    }

    pub(crate) fn rule_mut(&mut self, index: usize) -> Option<&mut Rule> {
        match self {
            Self::Single(rule) => (index == 0).then_some(rule),
            Self::Multi(set) => set.rules.get_mut(index),
        }
    }

    /// Returns how many times the set has been rebuilt.
    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            Self::Single(_) => 0,
            Self::Multi(set) => set.generation,
        }
    }

    /// Returns true for quantified sets.
    #[must_use]
    pub const fn is_quantified(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// Forwards a published changeset to the rules in the set.
    ///
    /// # Errors
    /// Returns any error raised while re-enumerating a changed domain. The
    /// set is left empty and retries on the next change.
    pub fn report_changes(
        &mut self,
        changes: &Changeset,
        env: &Environment,
        clock: Clock,
    ) -> Result<()> {
        match self {
            Self::Single(rule) => {
                rule.report_changes(changes, clock);
                Ok(())
            }
            Self::Multi(set) => set.report_changes(changes, env, clock),
        }
    }
}

// =============================================================================
// MultiRuleSet
// =============================================================================

/// A quantified declaration and the rules it currently expands to.
pub struct MultiRuleSet {
    name: String,
    body: Rc<dyn QuantifiedRuleBody>,
    rules: Vec<Rule>,
    domain: Readset,
    generation: u64,
    stale: bool,
}

impl std::fmt::Debug for MultiRuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiRuleSet")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("domain", &self.domain)
            .field("generation", &self.generation)
            .field("stale", &self.stale)
            .finish_non_exhaustive()
    }
}

impl MultiRuleSet {
    fn new(
        name: impl Into<String>,
        body: Rc<dyn QuantifiedRuleBody>,
        env: &Environment,
        clock: Clock,
    ) -> Result<Self> {
        let mut set = Self {
            name: name.into(),
            body,
            rules: Vec::new(),
            domain: Readset::new(),
            generation: 0,
            stale: false,
        };
        set.expand(env, clock)?;
        Ok(set)
    }

    /// Returns the paths the domain read when it was last enumerated.
    #[must_use]
    pub fn domain(&self) -> &Readset {
        &self.domain
    }

    /// Returns true if the last enumeration failed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    fn expand(&mut self, env: &Environment, clock: Clock) -> Result<()> {
        let mut ctx = ExecContext::read_only(env).tracking().with_clock(clock);
        let enumerated = self.body.enumerate(&mut ctx);
        self.domain = ctx.finish().readset;
        let tuples = match enumerated {
            Ok(tuples) => tuples,
            Err(err) => {
                self.rules.clear();
                self.stale = true;
                return Err(err.in_frame(format!("domain of {}", self.name)));
            }
        };
        self.stale = false;
        self.rules = tuples
            .into_iter()
            .map(|indexes| {
                let name = instance_name(&self.name, &indexes);
                let body = Rc::clone(&self.body);
                let action: Action =
                    Rc::new(move |ctx: &mut ExecContext<'_>| body.fire(&indexes, ctx));
                Rule::new(name, action)
            })
            .collect();
        Ok(())
    }

    fn report_changes(
        &mut self,
        changes: &Changeset,
        env: &Environment,
        clock: Clock,
    ) -> Result<()> {
        if self.stale || changes.affects(&self.domain) {
            let before = self.rules.len();
            self.generation += 1;
            let rebuilt = self.expand(env, clock);
            debug!(
                set = %self.name,
                before,
                after = self.rules.len(),
                generation = self.generation,
                stale = self.stale,
                "rebuilt quantified rules"
            );
            return rebuilt;
        }
        for rule in &mut self.rules {
            rule.report_changes(changes, clock);
        }
        Ok(())
    }
}

fn instance_name(name: &str, indexes: &[Value]) -> String {
    let rendered: Vec<String> = indexes.iter().map(ToString::to_string).collect();
    format!("{name}({})", rendered.join(", "))
}
