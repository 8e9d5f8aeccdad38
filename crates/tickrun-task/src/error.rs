#![forbid(unsafe_code)]

//! Failure types produced while driving tasks.
//!
//! A failure raised by a task deep inside a stack of nested tasks is
//! annotated by the [`Trampoline`](crate::Trampoline) with an
//! [`ObjectTrace`]: the owners of every frame that was live when the failure
//! happened, outermost first. Traces are diagnostic only; nothing should
//! branch on them.
//!
//! # Invariants
//!
//! 1. A [`TaskError::Traced`] never wraps another `Traced`. When an inner
//!    trampoline's traced failure passes through an outer trampoline, the two
//!    traces are concatenated into one flat list.
//! 2. An [`ObjectTrace`] never contains the same owner twice in a row.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;
use web_time::Duration;

/// Boxed error type accepted from task implementations.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result alias used throughout the task layer.
pub type TaskResult<T> = Result<T, TaskError>;

/// Ordered owner identities of the frames involved in a failure,
/// outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjectTrace(Vec<&'static str>);

impl ObjectTrace {
    /// Create an empty trace.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a trace from owners listed outermost first.
    ///
    /// Adjacent duplicates are collapsed.
    pub fn from_outermost(owners: impl IntoIterator<Item = &'static str>) -> Self {
        let mut trace = Self::new();
        for owner in owners {
            trace.push_inner(owner);
        }
        trace
    }

    /// Append an owner on the inner end, skipping it if it repeats the
    /// current innermost owner.
    pub fn push_inner(&mut self, owner: &'static str) {
        if self.0.last() != Some(&owner) {
            self.0.push(owner);
        }
    }

    /// Append a whole inner trace after this one.
    pub fn extend_inner(&mut self, inner: Self) {
        for owner in inner.0 {
            self.push_inner(owner);
        }
    }

    /// Owners, outermost first.
    #[must_use]
    pub fn as_slice(&self) -> &[&'static str] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outermost owner, if any.
    #[must_use]
    pub fn outermost(&self) -> Option<&'static str> {
        self.0.first().copied()
    }

    /// Innermost owner, i.e. the frame closest to where the failure started.
    #[must_use]
    pub fn innermost(&self) -> Option<&'static str> {
        self.0.last().copied()
    }
}

impl fmt::Display for ObjectTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, owner) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(owner)?;
        }
        Ok(())
    }
}

/// Errors raised by tasks and by the helpers that drive them.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A task failed with an arbitrary error.
    #[error("{0}")]
    Failed(#[source] BoxError),

    /// A task failed with a plain message.
    #[error("{0}")]
    Message(String),

    /// A failure annotated with the owners of the frames it passed through.
    #[error("task object trace: {trace}")]
    Traced {
        trace: ObjectTrace,
        #[source]
        source: Box<TaskError>,
    },

    /// A bounded synchronous wait ran out of time.
    #[error("task did not finish within {limit:?}")]
    Timeout { limit: Duration },

    /// A programming error detected while a task was running.
    #[error("assertion failed: {0}")]
    Assertion(String),
}

impl TaskError {
    /// Wrap an arbitrary error.
    pub fn custom(error: impl Into<BoxError>) -> Self {
        Self::Failed(error.into())
    }

    /// Build an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Build an assertion failure.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    /// Attach `outer` in front of whatever trace this error already carries.
    ///
    /// An error with no trace gets `outer` as its trace; an already traced
    /// error gets `outer ++ existing`. An empty `outer` leaves the error
    /// untouched.
    #[must_use]
    pub fn with_outer_trace(self, outer: ObjectTrace) -> Self {
        if outer.is_empty() {
            return self;
        }
        match self {
            Self::Traced { trace, source } => {
                let mut merged = outer;
                merged.extend_inner(trace);
                Self::Traced {
                    trace: merged,
                    source,
                }
            }
            other => Self::Traced {
                trace: outer,
                source: Box::new(other),
            },
        }
    }

    /// The object trace attached to this error, if any.
    #[must_use]
    pub fn object_trace(&self) -> Option<&ObjectTrace> {
        match self {
            Self::Traced { trace, .. } => Some(trace),
            _ => None,
        }
    }

    /// The error underneath any trace annotation.
    #[must_use]
    pub fn cause(&self) -> &Self {
        match self {
            Self::Traced { source, .. } => TaskError::cause(source),
            other => other,
        }
    }

    /// Whether this failure came from a timed-out wait.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.cause(), Self::Timeout { .. })
    }

    /// Whether this failure is a detected programming error.
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        matches!(self.cause(), Self::Assertion(_))
    }

    /// Find an error of type `E` among the wrapped causes.
    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let Self::Failed(inner) = self.cause() else {
            return None;
        };
        let mut current: &(dyn StdError + 'static) = &**inner;
        loop {
            if let Some(found) = current.downcast_ref::<E>() {
                return Some(found);
            }
            current = current.source()?;
        }
    }
}

impl From<BoxError> for TaskError {
    fn from(error: BoxError) -> Self {
        Self::Failed(error)
    }
}
