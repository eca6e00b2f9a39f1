//! Error types for the Taxiway kernel.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Errors fall into three families:
//! - **Runtime** failures are recoverable. A failing invariant is reported and
//!   the engine keeps running.
//! - **Internal** failures mean the engine was driven outside its protocol and
//!   are propagated to the caller untouched.
//! - **Early return** is not a failure at all: it is the control signal a rule
//!   body raises to stop executing, and the rule layer always swallows it.

use std::fmt;

use thiserror::Error;

/// The main error type for Taxiway operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Pushes a frame onto this error's context, creating the context if needed.
    #[must_use]
    pub fn in_frame(mut self, frame: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(frame));
        self
    }

    /// Creates a recoverable runtime error.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime(message.into()))
    }

    /// Creates an internal contract violation.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Creates the early-return control signal.
    #[must_use]
    pub fn early_return() -> Self {
        Self::new(ErrorKind::EarlyReturn)
    }

    /// Creates an undefined variable error.
    #[must_use]
    pub fn undefined_variable(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedVariable(name.into()))
    }

    /// Creates an error for an attempted write to a constant.
    #[must_use]
    pub fn constant_assignment(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConstantAssignment(name.into()))
    }

    /// Creates an error for a variable declared under a reserved name.
    #[must_use]
    pub fn reserved_name(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReservedName(name.into()))
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Returns true for failures the workspace may report and move past.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind, ErrorKind::Runtime(_))
    }

    /// Returns true if this is the early-return control signal.
    #[must_use]
    pub fn is_early_return(&self) -> bool {
        matches!(self.kind, ErrorKind::EarlyReturn)
    }

    /// Returns true for internal contract violations.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, ErrorKind::Internal(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Recoverable failure raised while evaluating model code.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The engine was driven outside its documented protocol.
    #[error("internal error: {0}")]
    Internal(String),

    /// A rule body returned early. Never surfaces past the rule layer.
    #[error("early return")]
    EarlyReturn,

    /// Variable was not declared in the environment.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// Assignment to a variable declared constant.
    #[error("cannot assign to constant: {0}")]
    ConstantAssignment(String),

    /// A variable was declared under the name of a synthetic path.
    #[error("variable name is reserved: {0}")]
    ReservedName(String),

    /// A snapshot lacks an entry for a declared variable.
    #[error("snapshot has no entry for variable: {0}")]
    MissingSnapshotEntry(String),

    /// Semantic limit exceeded (kill switch triggered).
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),
}

/// Semantic limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// The simulator made too many passes without firing a rule.
    MaxPasses {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPasses { limit } => {
                write!(f, "max simulator passes ({limit}) exceeded")
            }
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Rule or invariant that was executing.
    pub source: Option<String>,
    /// Stack of frames, innermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
