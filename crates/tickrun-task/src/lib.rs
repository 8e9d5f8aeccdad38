#![forbid(unsafe_code)]

//! Suspendable tasks for a single-threaded, tick-driven runtime.
//!
//! A [`Task`] is a state machine advanced one [`Step`] at a time. Tasks may
//! delegate to nested tasks; the [`Trampoline`] flattens the resulting tree
//! into a single unit with one `advance()` operation, so a scheduler only
//! ever has to deal with flat units of work.
//!
//! # Example
//!
//! ```
//! use tickrun_task::{Step, TaskExt, Trampoline, from_fn, wait_ticks};
//!
//! let mut stage = 0;
//! let task = from_fn(move |_| {
//!     stage += 1;
//!     match stage {
//!         1 => Ok(Step::delegate(wait_ticks(2))),
//!         _ => Ok(Step::done(42u32)),
//!     }
//! })
//! .named("Example");
//!
//! let mut trampoline = Trampoline::new(task);
//! while trampoline.advance().unwrap() {}
//! let result = trampoline.take_result().unwrap();
//! assert_eq!(result.downcast_ref::<u32>(), Some(&42));
//! ```

pub mod combinators;
pub mod error;
pub mod sync;
pub mod task;
pub mod trampoline;
pub mod typed;

pub use combinators::{
    FnTask, Named, Parallel, Ready, Sequence, TaskExt, WaitFor, WaitTicks, from_fn, parallel, ready,
    sequence, wait_for, wait_ticks,
};
pub use error::{BoxError, ObjectTrace, TaskError, TaskResult};
pub use sync::{sync_wait, sync_wait_get, sync_wait_with_timeout};
pub use task::{BoxTask, Step, Task, Value, downcast_value};
pub use trampoline::Trampoline;
pub use typed::{Typed, wrap};
