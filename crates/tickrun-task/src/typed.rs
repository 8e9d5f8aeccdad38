#![forbid(unsafe_code)]

//! Typed view over the untyped task mechanism.
//!
//! [`wrap`] runs a task on its own [`Trampoline`], pausing on every step the
//! inner task is still busy, and completes with the inner result once it
//! has been checked to really be a `T`. Parents that delegate to a
//! `Typed<T>` can therefore rely on the value they are resumed with.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{TaskError, TaskResult};
use crate::task::{Step, Task, Value};
use crate::trampoline::Trampoline;

/// A task whose result is checked to be a `T`. See [`wrap`].
pub struct Typed<T> {
    inner: Trampoline,
    _result: PhantomData<fn() -> T>,
}

/// Wrap `task`, claiming that its result is a `T`.
///
/// A `None` result is accepted for any `T`. A value of any other type fails
/// the wrapping task with a [`TaskError::Assertion`].
pub fn wrap<T: 'static>(task: impl Task + 'static) -> Typed<T> {
    Typed {
        inner: Trampoline::new(task),
        _result: PhantomData,
    }
}

impl<T: 'static> Task for Typed<T> {
    fn step(&mut self, _resumed: Option<Value>) -> TaskResult<Step> {
        if self.inner.advance()? {
            return Ok(Step::Pause);
        }
        match self.inner.take_result() {
            None => Ok(Step::finished()),
            Some(value) if value.is::<T>() => Ok(Step::Done(Some(value))),
            Some(_) => Err(TaskError::assertion(format!(
                "unexpected type returned from task: expected `{}`",
                type_name::<T>()
            ))),
        }
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("result", &type_name::<T>())
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TaskExt, from_fn, ready, sync_wait_get, wait_ticks};

    #[test]
    fn typed_passes_matching_value() {
        let task = wrap::<String>(ready("done".to_string()));
        assert_eq!(sync_wait_get::<String>(task).unwrap().as_deref(), Some("done"));
    }

    #[test]
    fn typed_accepts_empty_result() {
        assert_eq!(sync_wait_get::<u64>(wrap::<u64>(wait_ticks(2))).unwrap(), None);
    }

    #[test]
    fn typed_rejects_other_types() {
        let err = sync_wait_get::<u64>(wrap::<u64>(ready("nope"))).unwrap_err();
        assert!(err.is_assertion());
        assert!(err.to_string().contains("u64"));
    }

    #[test]
    fn typed_pauses_while_inner_runs() {
        let mut tramp = Trampoline::new(wrap::<()>(wait_ticks(2)));
        let mut steps = 1;
        while tramp.advance().unwrap() {
            steps += 1;
        }
        // Three inner steps, the last of which also completes the wrapper.
        assert_eq!(steps, 3);
    }

    #[test]
    fn inner_trace_is_concatenated_with_outer_owners() {
        fn failing_inner() -> impl Task {
            from_fn(|_| Err(TaskError::msg("deep failure"))).named("Inner")
        }

        let mut stage = 0;
        let outer = from_fn(move |_| {
            stage += 1;
            if stage == 1 {
                Ok(Step::delegate(wrap::<u8>(failing_inner())))
            } else {
                Ok(Step::finished())
            }
        })
        .named("Outer");

        let err = sync_wait_get::<()>(outer).unwrap_err();
        assert_eq!(err.object_trace().unwrap().as_slice(), &["Outer", "Inner"]);
        assert!(matches!(err.cause(), TaskError::Message(m) if m == "deep failure"));
    }
}
