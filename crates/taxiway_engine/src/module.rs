//! The compiled model a workspace runs.
//!
//! A [`Module`] bundles the declared variables, the rule declarations in
//! source order, and the invariant declarations in source order. Bodies are
//! opaque callables behind the [`RuleBody`], [`QuantifiedRuleBody`], and
//! [`InvariantBody`] traits; closures implement them directly.

use std::fmt;
use std::rc::Rc;

use taxiway_foundation::{Environment, Result, Value};

use crate::context::ExecContext;

// =============================================================================
// Bodies
// =============================================================================

/// The statement list of an unquantified rule.
pub trait RuleBody {
    /// Executes the body.
    ///
    /// # Errors
    /// Any error raised by the body. [`taxiway_foundation::Error::early_return`]
    /// ends the body normally.
    fn fire(&self, ctx: &mut ExecContext<'_>) -> Result<()>;
}

impl<F> RuleBody for F
where
    F: Fn(&mut ExecContext<'_>) -> Result<()>,
{
    fn fire(&self, ctx: &mut ExecContext<'_>) -> Result<()> {
        self(ctx)
    }
}

/// A rule quantified over one or more finite domains.
pub trait QuantifiedRuleBody {
    /// Enumerates the index tuples of the domain in order.
    ///
    /// # Errors
    /// Any error raised while evaluating the domain.
    fn enumerate(&self, ctx: &mut ExecContext<'_>) -> Result<Vec<Vec<Value>>>;

    /// Executes the body with the quantified variables bound to `indexes`.
    ///
    /// # Errors
    /// Any error raised by the body.
    fn fire(&self, indexes: &[Value], ctx: &mut ExecContext<'_>) -> Result<()>;
}

/// A [`QuantifiedRuleBody`] assembled from two closures.
pub struct ForEach<E, F> {
    enumerate: E,
    fire: F,
}

impl<E, F> ForEach<E, F>
where
    E: Fn(&mut ExecContext<'_>) -> Result<Vec<Vec<Value>>>,
    F: Fn(&[Value], &mut ExecContext<'_>) -> Result<()>,
{
    /// Pairs a domain enumerator with a body.
    #[must_use]
    pub fn new(enumerate: E, fire: F) -> Self {
        Self { enumerate, fire }
    }
}

impl<E, F> QuantifiedRuleBody for ForEach<E, F>
where
    E: Fn(&mut ExecContext<'_>) -> Result<Vec<Vec<Value>>>,
    F: Fn(&[Value], &mut ExecContext<'_>) -> Result<()>,
{
    fn enumerate(&self, ctx: &mut ExecContext<'_>) -> Result<Vec<Vec<Value>>> {
        (self.enumerate)(ctx)
    }

    fn fire(&self, indexes: &[Value], ctx: &mut ExecContext<'_>) -> Result<()> {
        (self.fire)(indexes, ctx)
    }
}

/// The predicate of an invariant.
pub trait InvariantBody {
    /// Checks the invariant.
    ///
    /// # Errors
    /// A runtime error means the invariant does not hold. Any other error is
    /// a fault.
    fn check(&self, ctx: &mut ExecContext<'_>) -> Result<()>;
}

impl<F> InvariantBody for F
where
    F: Fn(&mut ExecContext<'_>) -> Result<()>,
{
    fn check(&self, ctx: &mut ExecContext<'_>) -> Result<()> {
        self(ctx)
    }
}

// =============================================================================
// Declarations
// =============================================================================

/// How a declared rule runs.
#[derive(Clone)]
pub enum RuleKind {
    /// A single rule fired by the simulator.
    Plain(Rc<dyn RuleBody>),
    /// One rule per index tuple of a domain.
    Quantified(Rc<dyn QuantifiedRuleBody>),
    /// Fired only from outside, never by the simulator.
    External(Rc<dyn RuleBody>),
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Plain(_) => "Plain",
            Self::Quantified(_) => "Quantified",
            Self::External(_) => "External",
        };
        f.write_str(kind)
    }
}

/// A named rule declaration.
#[derive(Clone, Debug)]
pub struct RuleDecl {
    /// Declared name.
    pub name: String,
    /// Body and kind.
    pub kind: RuleKind,
}

impl RuleDecl {
    /// Returns true for rules the simulator may fire.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        !matches!(self.kind, RuleKind::External(_))
    }
}

/// A named invariant declaration.
#[derive(Clone)]
pub struct InvariantDecl {
    /// Declared name.
    pub name: String,
    /// Predicate.
    pub body: Rc<dyn InvariantBody>,
}

impl fmt::Debug for InvariantDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvariantDecl")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Module
// =============================================================================

/// A compiled model: variables, rules, and invariants.
///
/// Declaring a rule or invariant under a name already in use replaces the
/// earlier declaration in place.
#[derive(Clone, Debug, Default)]
pub struct Module {
    env: Environment,
    rules: Vec<RuleDecl>,
    invariants: Vec<InvariantDecl>,
}

impl Module {
    /// Creates a module over an environment.
    #[must_use]
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            rules: Vec::new(),
            invariants: Vec::new(),
        }
    }

    /// Declares a plain rule.
    #[must_use]
    pub fn with_rule<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut ExecContext<'_>) -> Result<()> + 'static,
    {
        self.with_rule_kind(name, RuleKind::Plain(Rc::new(body)))
    }

    /// Declares a rule quantified over the tuples `enumerate` returns.
    #[must_use]
    pub fn with_quantified_rule<E, F>(self, name: impl Into<String>, enumerate: E, body: F) -> Self
    where
        E: Fn(&mut ExecContext<'_>) -> Result<Vec<Vec<Value>>> + 'static,
        F: Fn(&[Value], &mut ExecContext<'_>) -> Result<()> + 'static,
    {
        self.with_rule_kind(
            name,
            RuleKind::Quantified(Rc::new(ForEach::new(enumerate, body))),
        )
    }

    /// Declares an external rule.
    #[must_use]
    pub fn with_external_rule<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut ExecContext<'_>) -> Result<()> + 'static,
    {
        self.with_rule_kind(name, RuleKind::External(Rc::new(body)))
    }

    /// Declares a rule of any kind.
    #[must_use]
    pub fn with_rule_kind(mut self, name: impl Into<String>, kind: RuleKind) -> Self {
        let name = name.into();
        match self.rules.iter_mut().find(|decl| decl.name == name) {
            Some(decl) => decl.kind = kind,
            None => self.rules.push(RuleDecl { name, kind }),
        }
        self
    }

    /// Declares an invariant.
    #[must_use]
    pub fn with_invariant<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut ExecContext<'_>) -> Result<()> + 'static,
    {
        self.with_invariant_body(name, Rc::new(body))
    }

    /// Declares an invariant from a shared body.
    #[must_use]
    pub fn with_invariant_body(
        mut self,
        name: impl Into<String>,
        body: Rc<dyn InvariantBody>,
    ) -> Self {
        let name = name.into();
        match self.invariants.iter_mut().find(|decl| decl.name == name) {
            Some(decl) => decl.body = body,
            None => self.invariants.push(InvariantDecl { name, body }),
        }
        self
    }

    /// Returns the declared variables.
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Returns the rule declarations in order.
    #[must_use]
    pub fn rules(&self) -> &[RuleDecl] {
        &self.rules
    }

    /// Returns the invariant declarations in order.
    #[must_use]
    pub fn invariants(&self) -> &[InvariantDecl] {
        &self.invariants
    }

    /// Splits the module into its parts.
    #[must_use]
    pub fn into_parts(self) -> (Environment, Vec<RuleDecl>, Vec<InvariantDecl>) {
        (self.env, self.rules, self.invariants)
    }
}
