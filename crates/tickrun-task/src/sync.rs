#![forbid(unsafe_code)]

//! Drive a task to completion on the calling thread.
//!
//! These helpers ignore pauses entirely: they call
//! [`Trampoline::advance`] in a tight loop with no external pacing. They
//! are meant for tests, tooling and start-up paths, never for code that runs
//! inside a tick.

use tracing::debug;
use web_time::{Duration, Instant};

use crate::error::{TaskError, TaskResult};
use crate::task::{Task, Value, downcast_value};
use crate::trampoline::Trampoline;

/// Run `task` to completion, returning its untyped result.
pub fn sync_wait(task: impl Task + 'static) -> TaskResult<Option<Value>> {
    let mut trampoline = Trampoline::new(task);
    while trampoline.advance()? {}
    Ok(trampoline.take_result())
}

/// Run `task` to completion and take its result as a `T`.
pub fn sync_wait_get<T: 'static>(task: impl Task + 'static) -> TaskResult<Option<T>> {
    downcast_value(sync_wait(task)?)
}

/// Run `task` to completion, failing with [`TaskError::Timeout`] if it is
/// still running after `limit` of wall-clock time.
///
/// The deadline is checked after every step that left work behind, so a
/// single long step can overrun it.
pub fn sync_wait_with_timeout(
    task: impl Task + 'static,
    limit: Duration,
) -> TaskResult<Option<Value>> {
    let started = Instant::now();
    let mut trampoline = Trampoline::new(task);
    while trampoline.advance()? {
        if started.elapsed() > limit {
            debug!(
                limit = ?limit,
                steps = trampoline.steps(),
                "synchronous wait timed out"
            );
            return Err(TaskError::Timeout { limit });
        }
    }
    Ok(trampoline.take_result())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Step, from_fn, ready, wait_ticks};
    use tracing_test::traced_test;

    #[test]
    fn sync_wait_drains_pauses() {
        assert!(sync_wait(wait_ticks(100)).unwrap().is_none());
    }

    #[test]
    fn sync_wait_get_downcasts() {
        assert_eq!(sync_wait_get::<i64>(ready(-4i64)).unwrap(), Some(-4));
        assert!(sync_wait_get::<i64>(ready(1u8)).unwrap_err().is_assertion());
    }

    #[test]
    fn timeout_fires_for_endless_task() {
        let endless = from_fn(|_| Ok(Step::Pause));
        let err = sync_wait_with_timeout(endless, Duration::from_millis(10)).unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, TaskError::Timeout { .. }));
    }

    #[test]
    #[traced_test]
    fn timeout_logs_the_limit() {
        let endless = from_fn(|_| Ok(Step::Pause));
        sync_wait_with_timeout(endless, Duration::from_millis(10)).unwrap_err();
        assert!(logs_contain("synchronous wait timed out"));
        assert!(logs_contain("limit=10ms"));
    }

    #[test]
    fn timeout_not_hit_by_quick_task() {
        let value = sync_wait_with_timeout(ready(5u8), Duration::from_secs(5)).unwrap();
        assert_eq!(value.unwrap().downcast_ref::<u8>(), Some(&5));
    }

    #[test]
    fn task_error_is_distinct_from_timeout() {
        let failing = from_fn(|_| Err(TaskError::msg("own failure")));
        let err = sync_wait_with_timeout(failing, Duration::from_secs(5)).unwrap_err();
        assert!(!err.is_timeout());
    }
}
