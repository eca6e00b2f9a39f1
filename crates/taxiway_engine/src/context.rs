//! Execution context handed to rule and invariant bodies.
//!
//! An [`ExecContext`] is the only way a body touches model state. Every read
//! goes through it so the paths can be recorded, every use of the clock is
//! noted, and every `past(t)` that is not yet true lowers the wake-up time.
//!
//! Rule bodies get a writable context inside one of the workspace's gates.
//! Invariants and quantified domains get a read-only one: they observe the
//! state and never change it.

use taxiway_foundation::path::{self, PathSegment};
use taxiway_foundation::{CLOCK, CLOCK_ADVANCED, Clock, Environment, Error, Readset, Result, Value};

// =============================================================================
// Output
// =============================================================================

/// One value emitted by a body onto a named output channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputEntry {
    /// Channel name.
    pub channel: String,
    /// Emitted value.
    pub value: Value,
}

/// Emitted values in the order they were produced.
pub type OutputBuffer = Vec<OutputEntry>;

// =============================================================================
// Observation
// =============================================================================

/// What a finished evaluation observed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Observation {
    /// Paths that were read.
    pub readset: Readset,
    /// Earliest `past(t)` deadline that was not yet reached, if any.
    pub next_wake: Option<Clock>,
}

// =============================================================================
// ExecContext
// =============================================================================

enum Store<'a> {
    Writable(&'a mut Environment),
    ReadOnly(&'a Environment),
}

/// Evaluation context for one run of a body.
pub struct ExecContext<'a> {
    env: Store<'a>,
    readset: Option<Readset>,
    clock: Option<Clock>,
    next_wake: Option<Clock>,
    asynchronous: bool,
    output: Option<&'a mut OutputBuffer>,
}

impl<'a> ExecContext<'a> {
    /// Creates a writable context with no tracking, no clock, and no output
    /// sink.
    #[must_use]
    pub fn new(env: &'a mut Environment) -> Self {
        Self::over(Store::Writable(env))
    }

    /// Creates a context in which every write is refused.
    #[must_use]
    pub fn read_only(env: &'a Environment) -> Self {
        Self::over(Store::ReadOnly(env))
    }

    fn over(env: Store<'a>) -> Self {
        Self {
            env,
            readset: None,
            clock: None,
            next_wake: None,
            asynchronous: false,
            output: None,
        }
    }

    /// Enables readset tracking.
    #[must_use]
    pub fn tracking(mut self) -> Self {
        self.readset = Some(Readset::new());
        self
    }

    /// Makes the current clock available.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets asynchronous mode, in which every `past(t)` holds.
    #[must_use]
    pub fn asynchronous(mut self, enabled: bool) -> Self {
        self.asynchronous = enabled;
        self
    }

    /// Routes emitted values into `output`. Without a sink they are dropped.
    #[must_use]
    pub fn with_output(mut self, output: &'a mut OutputBuffer) -> Self {
        self.output = Some(output);
        self
    }

    /// Reads a whole variable.
    ///
    /// # Errors
    /// Returns an error if the variable is not declared.
    pub fn read(&mut self, name: &str) -> Result<Value> {
        let value = self.env().get(name)?.clone();
        self.record_read(name);
        Ok(value)
    }

    /// Reads a field or element nested inside a variable.
    ///
    /// Only the full path is recorded, so the reader is invalidated by
    /// changes at that path and not by changes to its siblings.
    ///
    /// # Errors
    /// Returns a runtime error if the path does not exist in the current
    /// value.
    pub fn read_path(&mut self, name: &str, segments: &[PathSegment]) -> Result<Value> {
        let mut current = self.env().get(name)?;
        for (depth, segment) in segments.iter().enumerate() {
            let next = match segment {
                PathSegment::Field(field) => current.field(field),
                PathSegment::Index(i) => current.index(*i),
            };
            current = next.ok_or_else(|| {
                Error::runtime(format!(
                    "{} has no {}",
                    path::render(name, &segments[..depth]),
                    segment
                ))
            })?;
        }
        let value = current.clone();
        self.record_read(path::render(name, segments));
        Ok(value)
    }

    /// Records a read without fetching anything.
    pub fn record_read(&mut self, path: impl Into<String>) {
        if let Some(readset) = &mut self.readset {
            readset.record(path);
        }
    }

    /// Returns true if writes are refused.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self.env, Store::ReadOnly(_))
    }

    /// Assigns a variable.
    ///
    /// # Errors
    /// Returns an error if the variable is undeclared or constant, and an
    /// internal error if the context is read-only.
    pub fn write(&mut self, name: &str, value: Value) -> Result<()> {
        match &mut self.env {
            Store::Writable(env) => env.set(name, value),
            Store::ReadOnly(_) => Err(Error::internal(format!(
                "cannot assign {name} from a read-only context"
            ))),
        }
    }

    /// Returns the current clock and records the dependency on it.
    ///
    /// # Errors
    /// Returns an internal error if the context carries no clock.
    pub fn clock(&mut self) -> Result<Clock> {
        let clock = self
            .clock
            .ok_or_else(|| Error::internal("clock is not available in this context"))?;
        self.record_read(CLOCK);
        self.record_read(CLOCK_ADVANCED);
        Ok(clock)
    }

    /// Returns true once the clock has reached `t`.
    ///
    /// When it has not, `t` becomes a candidate wake-up time for this
    /// evaluation.
    ///
    /// # Errors
    /// Returns an internal error if the context carries no clock.
    pub fn past(&mut self, t: Clock) -> Result<bool> {
        if self.asynchronous {
            return Ok(true);
        }
        let clock = self
            .clock
            .ok_or_else(|| Error::internal("past() needs a clock in context"))?;
        if t <= clock {
            return Ok(true);
        }
        self.next_wake = Some(self.next_wake.map_or(t, |wake| wake.min(t)));
        Ok(false)
    }

    /// Emits a value on an output channel.
    pub fn emit(&mut self, channel: impl Into<String>, value: Value) {
        if let Some(output) = &mut self.output {
            output.push(OutputEntry {
                channel: channel.into(),
                value,
            });
        }
    }

    /// Returns the environment without recording a read.
    #[must_use]
    pub fn env(&self) -> &Environment {
        match &self.env {
            Store::Writable(env) => &**env,
            Store::ReadOnly(env) => *env,
        }
    }

    /// Ends the evaluation and returns what it observed.
    #[must_use]
    pub fn finish(self) -> Observation {
        Observation {
            readset: self.readset.unwrap_or_default(),
            next_wake: self.next_wake,
        }
    }
}
