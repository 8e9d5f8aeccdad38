#![forbid(unsafe_code)]

//! The suspendable computation contract.
//!
//! A [`Task`] is an explicit state machine. Each call to [`Task::step`]
//! advances it by one step and reports one of three outcomes:
//!
//! - [`Step::Pause`]: nothing more to do this tick; resume next tick.
//! - [`Step::Delegate`]: run the nested task to completion first, then
//!   resume this task with the nested task's result.
//! - [`Step::Done`]: the task is complete, optionally producing a value.
//!
//! Values are untyped ([`Value`]); callers claim a typed view through
//! [`wrap`](crate::wrap) or [`downcast_value`].

use std::any::{Any, type_name};
use std::fmt;

use crate::error::{TaskError, TaskResult};

/// An untyped value produced by a task.
pub type Value = Box<dyn Any>;

/// A heap-allocated task, as held on a trampoline's frame stack.
pub type BoxTask = Box<dyn Task>;

/// The outcome of advancing a task by one step.
pub enum Step {
    /// Yield until the next tick.
    Pause,
    /// Drive the nested task first and resume with its result.
    Delegate(BoxTask),
    /// Completed, with an optional result.
    Done(Option<Value>),
}

impl Step {
    /// Complete with `value`.
    pub fn done<T: 'static>(value: T) -> Self {
        Self::Done(Some(Box::new(value)))
    }

    /// Complete without a value.
    #[must_use]
    pub const fn finished() -> Self {
        Self::Done(None)
    }

    /// Delegate to `task`.
    pub fn delegate(task: impl Task + 'static) -> Self {
        Self::Delegate(Box::new(task))
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pause => f.write_str("Pause"),
            Self::Delegate(task) => f
                .debug_tuple("Delegate")
                .field(&task.owner().unwrap_or("<anonymous>"))
                .finish(),
            Self::Done(value) => f
                .debug_tuple("Done")
                .field(&value.as_ref().map(|_| "<value>"))
                .finish(),
        }
    }
}

/// A suspendable computation.
///
/// `resumed` carries the result of the most recently completed nested task
/// on the step right after it finished, and is `None` on every other step.
pub trait Task {
    /// Advance by one step.
    fn step(&mut self, resumed: Option<Value>) -> TaskResult<Step>;

    /// Identity of the object this task runs on behalf of.
    ///
    /// Used only to build failure traces. Frames without an owner are left
    /// out of the trace.
    fn owner(&self) -> Option<&'static str> {
        None
    }
}

impl<T: Task + ?Sized> Task for Box<T> {
    fn step(&mut self, resumed: Option<Value>) -> TaskResult<Step> {
        (**self).step(resumed)
    }

    fn owner(&self) -> Option<&'static str> {
        (**self).owner()
    }
}

/// Take a typed value out of an untyped task result.
///
/// `None` stays `None`. A value of any other type than `T` is reported as a
/// [`TaskError::Assertion`].
pub fn downcast_value<T: 'static>(value: Option<Value>) -> TaskResult<Option<T>> {
    match value {
        None => Ok(None),
        Some(value) => value.downcast::<T>().map(|v| Some(*v)).map_err(|_| {
            TaskError::assertion(format!(
                "unexpected type returned from task: expected `{}`",
                type_name::<T>()
            ))
        }),
    }
}
