#![forbid(unsafe_code)]

//! Small building blocks for writing tasks without hand-rolled structs.
//!
//! - [`from_fn`]: a task from a step closure.
//! - [`ready`]: completes immediately with a value.
//! - [`wait_ticks`] / [`wait_for`]: pause for a number of ticks or until a
//!   wall-clock duration has elapsed.
//! - [`sequence`]: run tasks one after another.
//! - [`parallel`]: advance several tasks side by side within one tick.
//! - [`TaskExt::named`]: give a task an owner for failure traces.

use std::fmt;

use tracing::trace;
use web_time::{Duration, Instant};

use crate::error::TaskResult;
use crate::task::{BoxTask, Step, Task, Value};
use crate::trampoline::Trampoline;

/// Task built from a step closure. See [`from_fn`].
pub struct FnTask<F> {
    step: F,
}

/// Build a task whose steps are produced by `step`.
pub fn from_fn<F>(step: F) -> FnTask<F>
where
    F: FnMut(Option<Value>) -> TaskResult<Step>,
{
    FnTask { step }
}

impl<F> Task for FnTask<F>
where
    F: FnMut(Option<Value>) -> TaskResult<Step>,
{
    fn step(&mut self, resumed: Option<Value>) -> TaskResult<Step> {
        (self.step)(resumed)
    }
}

impl<F> fmt::Debug for FnTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask").finish_non_exhaustive()
    }
}

/// Task that completes on its first step. See [`ready`].
#[derive(Debug)]
pub struct Ready<T> {
    value: Option<T>,
}

/// A task that completes immediately with `value`.
pub fn ready<T: 'static>(value: T) -> Ready<T> {
    Ready { value: Some(value) }
}

impl<T: 'static> Task for Ready<T> {
    fn step(&mut self, _resumed: Option<Value>) -> TaskResult<Step> {
        Ok(Step::Done(
            self.value.take().map(|value| Box::new(value) as Value),
        ))
    }
}

/// Task that pauses a fixed number of times. See [`wait_ticks`].
#[derive(Debug, Clone)]
pub struct WaitTicks {
    remaining: u64,
}

/// Pause `ticks` times, then complete without a value.
#[must_use]
pub fn wait_ticks(ticks: u64) -> WaitTicks {
    WaitTicks { remaining: ticks }
}

impl Task for WaitTicks {
    fn step(&mut self, _resumed: Option<Value>) -> TaskResult<Step> {
        if self.remaining == 0 {
            return Ok(Step::finished());
        }
        self.remaining -= 1;
        Ok(Step::Pause)
    }
}

/// Task that pauses until a duration has elapsed. See [`wait_for`].
#[derive(Debug, Clone)]
pub struct WaitFor {
    duration: Duration,
    started: Option<Instant>,
}

/// Pause every tick until `duration` of wall-clock time has passed since
/// the first step.
#[must_use]
pub fn wait_for(duration: Duration) -> WaitFor {
    WaitFor {
        duration,
        started: None,
    }
}

impl Task for WaitFor {
    fn step(&mut self, _resumed: Option<Value>) -> TaskResult<Step> {
        let started = *self.started.get_or_insert_with(Instant::now);
        if started.elapsed() >= self.duration {
            Ok(Step::finished())
        } else {
            Ok(Step::Pause)
        }
    }
}

/// Runs tasks one after another. See [`sequence`].
pub struct Sequence {
    tasks: std::vec::IntoIter<BoxTask>,
}

/// Run `tasks` in order, delegating to each in turn.
///
/// Completes with the result of the last task.
pub fn sequence(tasks: impl IntoIterator<Item = BoxTask>) -> Sequence {
    Sequence {
        tasks: tasks.into_iter().collect::<Vec<_>>().into_iter(),
    }
}

impl Task for Sequence {
    fn step(&mut self, resumed: Option<Value>) -> TaskResult<Step> {
        // `resumed` carries the previous member's result; only the final
        // member's result is kept.
        match self.tasks.next() {
            Some(next) => Ok(Step::Delegate(next)),
            None => Ok(Step::Done(resumed)),
        }
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("remaining", &self.tasks.len())
            .finish()
    }
}

/// Advances several tasks side by side. See [`parallel`].
pub struct Parallel {
    running: Vec<(usize, Trampoline)>,
    results: Vec<Option<Value>>,
    rounds: u64,
}

/// Run `tasks` concurrently within the same ticks.
///
/// Each step advances every unfinished task once, drops the ones that
/// finished, and pauses. Once none remain the group completes with a
/// `Vec<Option<Value>>` of results in input order. A failure in any member
/// fails the whole group immediately.
pub fn parallel(tasks: impl IntoIterator<Item = BoxTask>) -> Parallel {
    let running: Vec<_> = tasks
        .into_iter()
        .map(Trampoline::from_boxed)
        .enumerate()
        .collect();
    let results = running.iter().map(|_| None).collect();
    Parallel {
        running,
        results,
        rounds: 0,
    }
}

impl Parallel {
    /// Number of member tasks still running.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.running.len()
    }
}

impl Task for Parallel {
    fn step(&mut self, _resumed: Option<Value>) -> TaskResult<Step> {
        if self.running.is_empty() {
            let results = std::mem::take(&mut self.results);
            return Ok(Step::done(results));
        }

        self.rounds += 1;
        for (_, trampoline) in &mut self.running {
            trampoline.advance()?;
        }

        let mut still_running = Vec::with_capacity(self.running.len());
        for (index, mut trampoline) in self.running.drain(..) {
            if trampoline.is_done() {
                self.results[index] = trampoline.take_result();
            } else {
                still_running.push((index, trampoline));
            }
        }
        self.running = still_running;
        trace!(
            round = self.rounds,
            remaining = self.running.len(),
            "parallel round finished"
        );
        Ok(Step::Pause)
    }
}

impl fmt::Debug for Parallel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parallel")
            .field("remaining", &self.running.len())
            .field("rounds", &self.rounds)
            .finish()
    }
}

/// A task tagged with an owner identity. See [`TaskExt::named`].
#[derive(Debug)]
pub struct Named<T> {
    inner: T,
    owner: &'static str,
}

impl<T: Task> Task for Named<T> {
    fn step(&mut self, resumed: Option<Value>) -> TaskResult<Step> {
        self.inner.step(resumed)
    }

    fn owner(&self) -> Option<&'static str> {
        Some(self.owner)
    }
}

/// Convenience adapters available on every task.
pub trait TaskExt: Task + Sized + 'static {
    /// Report `owner` as this task's identity in failure traces.
    fn named(self, owner: &'static str) -> Named<Self> {
        Named { inner: self, owner }
    }

    /// Box the task.
    fn boxed(self) -> BoxTask {
        Box::new(self)
    }
}

impl<T: Task + Sized + 'static> TaskExt for T {}
