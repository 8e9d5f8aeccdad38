#![forbid(unsafe_code)]

//! Flattens a tree of nested tasks into one steppable unit.
//!
//! # Design
//!
//! [`Trampoline`] owns a LIFO stack of frames, innermost on top. Each call to
//! [`advance`](Trampoline::advance) steps only the top frame:
//!
//! - `Pause` leaves the stack alone.
//! - `Delegate(nested)` pushes `nested`; the next call drives it.
//! - `Done(value)` pops the frame. If frames remain, `value` is handed to
//!   the newly exposed frame on its next step; otherwise it becomes the
//!   overall result.
//!
//! # Invariants
//!
//! 1. Exactly one frame is stepped per `advance()`.
//! 2. `advance()` returns `Ok(false)` exactly once, on the step that empties
//!    the stack.
//! 3. Calling `advance()` after the stack emptied, or reading the result
//!    before it did, panics.
//!
//! # Failure Modes
//!
//! - **Frame fails**: the owners of every frame on the stack at that moment
//!   (outermost first) are attached to the error as an
//!   [`ObjectTrace`](crate::ObjectTrace); an already traced error from a
//!   nested trampoline gets the outer owners prepended. The stack is then
//!   discarded and the trampoline counts as done with no readable result.

use std::fmt;

use tracing::trace;

use crate::error::{ObjectTrace, TaskResult};
use crate::task::{BoxTask, Step, Task, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Completed,
    ResultTaken,
    Failed,
}

/// Drives a possibly deeply nested task as one unit.
pub struct Trampoline {
    stack: Vec<BoxTask>,
    /// Result of the frame popped last, handed to the next step.
    resumed: Option<Value>,
    result: Option<Value>,
    state: State,
    steps: u64,
}

impl Trampoline {
    /// Create a trampoline whose single frame is `root`.
    pub fn new(root: impl Task + 'static) -> Self {
        Self::from_boxed(Box::new(root))
    }

    /// Create a trampoline from an already boxed task.
    #[must_use]
    pub fn from_boxed(root: BoxTask) -> Self {
        Self {
            stack: vec![root],
            resumed: None,
            result: None,
            state: State::Running,
            steps: 0,
        }
    }

    /// Whether no frames remain, either because the task completed or
    /// because it failed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    /// Whether the last `advance()` failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state == State::Failed
    }

    /// Number of frames currently on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Number of `advance()` calls made so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Drive the top frame by one step.
    ///
    /// Returns `Ok(true)` while more work remains and `Ok(false)` once the
    /// whole computation has completed.
    ///
    /// # Panics
    ///
    /// Panics if the trampoline is already done.
    pub fn advance(&mut self) -> TaskResult<bool> {
        let Some(top) = self.stack.last_mut() else {
            panic!("Trampoline::advance called after the task finished");
        };
        self.steps += 1;

        let resumed = self.resumed.take();
        let step = match top.step(resumed) {
            Ok(step) => step,
            Err(err) => {
                let trace = self.object_trace();
                trace!(depth = self.stack.len(), trace = %trace, "task frame failed");
                self.stack.clear();
                self.state = State::Failed;
                return Err(err.with_outer_trace(trace));
            }
        };

        match step {
            Step::Pause => Ok(true),
            Step::Delegate(nested) => {
                self.stack.push(nested);
                trace!(depth = self.stack.len(), "delegated to nested task");
                Ok(true)
            }
            Step::Done(value) => {
                self.stack.pop();
                if self.stack.is_empty() {
                    self.result = value;
                    self.state = State::Completed;
                    Ok(false)
                } else {
                    self.resumed = value;
                    Ok(true)
                }
            }
        }
    }

    /// The final result.
    ///
    /// # Panics
    ///
    /// Panics unless the task completed and the result was not taken yet.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        self.assert_completed();
        self.result.as_ref()
    }

    /// Move the final result out.
    ///
    /// # Panics
    ///
    /// Panics unless the task completed and the result was not taken yet.
    pub fn take_result(&mut self) -> Option<Value> {
        self.assert_completed();
        self.state = State::ResultTaken;
        self.result.take()
    }

    fn assert_completed(&self) {
        match self.state {
            State::Completed => {}
            State::Running => panic!("Trampoline result read before the task finished"),
            State::ResultTaken => panic!("Trampoline result was already taken"),
            State::Failed => panic!("Trampoline result read after the task failed"),
        }
    }

    /// Owners of the frames currently on the stack, outermost first.
    fn object_trace(&self) -> ObjectTrace {
        ObjectTrace::from_outermost(self.stack.iter().filter_map(|frame| frame.owner()))
    }
}

impl fmt::Debug for Trampoline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trampoline")
            .field("depth", &self.stack.len())
            .field("state", &self.state)
            .field("steps", &self.steps)
            .finish()
    }
}
