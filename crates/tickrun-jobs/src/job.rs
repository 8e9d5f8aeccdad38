#![forbid(unsafe_code)]

//! Job identity, submission options and the caller-facing handle.
//!
//! A job is one [`Trampoline`] plus the metadata the scheduler needs to
//! drive it. The caller only ever sees a [`JobHandle`], which shares the
//! job's status title and final outcome with the scheduler through an
//! `Rc`.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tickrun_task::{Step, Task, TaskError, TaskResult, Trampoline, Value, downcast_value};

/// Scheduler-assigned job identifier, unique per scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// Callback invoked when a job fails.
pub type ExceptionHandler = Box<dyn FnMut(&TaskError)>;

/// Options for [`JobScheduler::submit`](crate::JobScheduler::submit).
///
/// Jobs are blocking by default.
pub struct JobOptions {
    pub blocking: bool,
    pub status_title: Option<String>,
    pub on_exception: Option<ExceptionHandler>,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            blocking: true,
            status_title: None,
            on_exception: None,
        }
    }
}

impl JobOptions {
    /// Options for a job that does not hold the UI in a blocking state.
    #[must_use]
    pub fn non_blocking() -> Self {
        Self::default().with_blocking(false)
    }

    #[must_use]
    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    #[must_use]
    pub fn with_status_title(mut self, title: impl Into<String>) -> Self {
        self.status_title = Some(title.into());
        self
    }

    /// Handle failures of this job locally instead of failing the tick.
    #[must_use]
    pub fn with_exception_handler(mut self, handler: impl FnMut(&TaskError) + 'static) -> Self {
        self.on_exception = Some(Box::new(handler));
        self
    }
}

impl fmt::Debug for JobOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobOptions")
            .field("blocking", &self.blocking)
            .field("status_title", &self.status_title)
            .field("on_exception", &self.on_exception.is_some())
            .finish()
    }
}

/// How a job ended.
pub enum JobOutcome {
    /// The task completed; the value is present until taken.
    Completed(Option<Value>),
    /// The task failed. Holds the innermost failure message.
    Failed(String),
}

impl fmt::Debug for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(value) => f
                .debug_tuple("Completed")
                .field(&value.as_ref().map(|_| "<value>"))
                .finish(),
            Self::Failed(message) => f.debug_tuple("Failed").field(message).finish(),
        }
    }
}

/// State shared between a running job and its handles.
#[derive(Debug)]
pub(crate) struct JobShared {
    id: JobId,
    finished: Cell<bool>,
    status_title: RefCell<Option<String>>,
    outcome: RefCell<Option<JobOutcome>>,
}

/// A job as held by the scheduler.
pub(crate) struct Job {
    pub(crate) id: JobId,
    pub(crate) trampoline: Trampoline,
    pub(crate) blocking: bool,
    pub(crate) on_exception: Option<ExceptionHandler>,
    pub(crate) shared: Rc<JobShared>,
}

impl Job {
    pub(crate) fn new(id: JobId, trampoline: Trampoline, options: JobOptions) -> (Self, JobHandle) {
        let shared = Rc::new(JobShared {
            id,
            finished: Cell::new(false),
            status_title: RefCell::new(options.status_title),
            outcome: RefCell::new(None),
        });
        let handle = JobHandle {
            shared: Rc::clone(&shared),
        };
        let job = Self {
            id,
            trampoline,
            blocking: options.blocking,
            on_exception: options.on_exception,
            shared,
        };
        (job, handle)
    }

    pub(crate) fn status_title(&self) -> Option<String> {
        self.shared.status_title.borrow().clone()
    }

    /// Record the outcome and mark the job finished.
    pub(crate) fn finish(&self, outcome: JobOutcome) {
        *self.shared.outcome.borrow_mut() = Some(outcome);
        self.shared.finished.set(true);
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("blocking", &self.blocking)
            .field("trampoline", &self.trampoline)
            .finish_non_exhaustive()
    }
}

/// Caller-side view of a submitted job.
///
/// Cloning a handle creates a new handle to the same job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    shared: Rc<JobShared>,
}

impl JobHandle {
    #[must_use]
    pub fn id(&self) -> JobId {
        self.shared.id
    }

    /// Whether the job completed or failed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.shared.finished.get()
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(*self.shared.outcome.borrow(), Some(JobOutcome::Failed(_)))
    }

    /// How the job ended, or `None` while it is still running.
    #[must_use]
    pub fn outcome(&self) -> Option<Ref<'_, JobOutcome>> {
        Ref::filter_map(self.shared.outcome.borrow(), Option::as_ref).ok()
    }

    /// The failure message, if the job failed.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        match &*self.shared.outcome.borrow() {
            Some(JobOutcome::Failed(message)) => Some(message.clone()),
            _ => None,
        }
    }

    /// Move the completed job's value out. Later calls return `None`.
    pub fn take_value(&self) -> Option<Value> {
        match &mut *self.shared.outcome.borrow_mut() {
            Some(JobOutcome::Completed(value)) => value.take(),
            _ => None,
        }
    }

    /// Move the completed job's value out as a `T`.
    pub fn take_value_as<T: 'static>(&self) -> TaskResult<Option<T>> {
        downcast_value(self.take_value())
    }

    #[must_use]
    pub fn status_title(&self) -> Option<String> {
        self.shared.status_title.borrow().clone()
    }

    /// Update the progress text shown while the job runs.
    pub fn set_status_title(&self, title: impl Into<String>) {
        *self.shared.status_title.borrow_mut() = Some(title.into());
    }

    /// A task that pauses until this job finishes.
    ///
    /// It completes with the job's value, taking it out of the handle. A
    /// failed job completes the wait without a value; the failure itself
    /// is reported through the scheduler.
    #[must_use]
    pub fn wait(&self) -> WaitForJob {
        WaitForJob {
            handle: self.clone(),
        }
    }
}

/// Task returned by [`JobHandle::wait`].
#[derive(Debug)]
pub struct WaitForJob {
    handle: JobHandle,
}

impl Task for WaitForJob {
    fn step(&mut self, _resumed: Option<Value>) -> TaskResult<Step> {
        if self.handle.is_finished() {
            Ok(Step::Done(self.handle.take_value()))
        } else {
            Ok(Step::Pause)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickrun_task::ready;

    fn job_with(options: JobOptions) -> (Job, JobHandle) {
        Job::new(JobId(1), Trampoline::new(ready(5u8)), options)
    }

    #[test]
    fn options_default_to_blocking() {
        let options = JobOptions::default();
        assert!(options.blocking);
        assert!(options.status_title.is_none());
        assert!(!JobOptions::non_blocking().blocking);
    }

    #[test]
    fn handle_reflects_completion() {
        let (job, handle) = job_with(JobOptions::default());
        assert!(!handle.is_finished());
        assert!(handle.outcome().is_none());

        job.finish(JobOutcome::Completed(Some(Box::new(5u8))));
        assert!(handle.is_finished());
        assert!(!handle.is_failed());
        assert!(matches!(*handle.outcome().unwrap(), JobOutcome::Completed(Some(_))));
        assert_eq!(handle.take_value_as::<u8>().unwrap(), Some(5));
        assert!(handle.take_value().is_none());
    }

    #[test]
    fn handle_reflects_failure() {
        let (job, handle) = job_with(JobOptions::default());
        job.finish(JobOutcome::Failed("broken pipe".into()));
        assert!(handle.is_failed());
        assert_eq!(handle.failure_message().as_deref(), Some("broken pipe"));
        assert!(handle.take_value().is_none());
    }

    #[test]
    fn status_title_is_shared() {
        let (job, handle) = job_with(JobOptions::default().with_status_title("Loading"));
        assert_eq!(job.status_title().as_deref(), Some("Loading"));
        handle.clone().set_status_title("Installing");
        assert_eq!(job.status_title().as_deref(), Some("Installing"));
    }

    #[test]
    fn wait_pauses_until_finished() {
        let (job, handle) = job_with(JobOptions::default());
        let mut waiter = Trampoline::new(handle.wait());
        assert!(waiter.advance().unwrap());
        job.finish(JobOutcome::Completed(Some(Box::new(5u8))));
        assert!(!waiter.advance().unwrap());
        assert_eq!(waiter.take_result().unwrap().downcast_ref::<u8>(), Some(&5));
    }
}
