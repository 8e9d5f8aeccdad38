#![forbid(unsafe_code)]

//! Cooperative job scheduler driven by an external tick.
//!
//! # Design
//!
//! Jobs live in two lists. `pending` receives every submission, including
//! submissions made by running tasks through a [`JobSpawner`] while a tick
//! is in progress. `active` holds the jobs being driven, in submission
//! order. Pending jobs are merged into `active` only at the start of a tick
//! and right after the drive pass, so the pass never observes a list that
//! changes under it.
//!
//! # Invariants
//!
//! 1. Each active job is advanced at most once per tick.
//! 2. A job submitted during a tick is not advanced before the next tick.
//! 3. `BlockingLoadStarted` and `BlockingLoadComplete` alternate strictly:
//!    "started" fires when a blocking job is submitted while no blocking
//!    load is announced, and "complete" fires at the end of the first tick
//!    after which no blocking job remains.
//! 4. A tick with no pending and no active jobs emits nothing.
//! 5. Notifications raised while listeners run (for example a listener
//!    submitting a blocking job) are queued and delivered after the
//!    current one, in order.
//!
//! # Failure Modes
//!
//! - **Job fails with a handler**: the handler runs, listeners receive
//!   [`SchedulerEvent::Exception`], the job is finished as failed and the
//!   pass continues with the next job.
//! - **Job fails without a handler**: the job is finished as failed and the
//!   pass stops. Jobs not yet advanced stay active, pending jobs are merged,
//!   the blocking state is settled, and `tick()` returns
//!   [`SchedulerError::AsyncOperation`].

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::rc::Rc;

use tickrun_task::{Task, TaskError, Trampoline};
use tracing::{debug, error, trace, warn};

use crate::error::SchedulerError;
use crate::job::{Job, JobHandle, JobId, JobOptions, JobOutcome};

/// Notification broadcast to scheduler listeners.
#[derive(Debug, Clone, Copy)]
pub enum SchedulerEvent<'a> {
    /// A blocking job was submitted while nothing was blocking.
    BlockingLoadStarted,
    /// The last blocking job finished.
    BlockingLoadComplete,
    /// A job with an exception handler failed.
    Exception { job: JobId, error: &'a TaskError },
}

type Listener = Box<dyn FnMut(&SchedulerEvent<'_>)>;

/// Owned form of [`SchedulerEvent`] waiting for delivery.
enum Notice {
    Started,
    Complete,
    Exception { job: JobId, error: Rc<TaskError> },
}

impl Notice {
    fn as_event(&self) -> SchedulerEvent<'_> {
        match self {
            Self::Started => SchedulerEvent::BlockingLoadStarted,
            Self::Complete => SchedulerEvent::BlockingLoadComplete,
            Self::Exception { job, error } => SchedulerEvent::Exception { job: *job, error },
        }
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Label attached to every log record of this scheduler.
    pub name: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: "jobs".to_owned(),
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// State reachable from both the scheduler and its spawners.
struct Shared {
    name: String,
    next_id: Cell<u64>,
    pending: RefCell<Vec<Job>>,
    /// Unfinished blocking jobs, pending or active.
    blocking_jobs: Cell<usize>,
    /// Whether `BlockingLoadStarted` fired without a matching "complete".
    announced: Cell<bool>,
    listeners: RefCell<Vec<Listener>>,
    notices: RefCell<VecDeque<Notice>>,
    emitting: Cell<bool>,
}

impl Shared {
    fn emit(&self, notice: Notice) {
        self.notices.borrow_mut().push_back(notice);
        if self.emitting.replace(true) {
            return;
        }

        // Listeners run with the list taken out so they may register
        // further listeners without a double borrow.
        let mut current = mem::take(&mut *self.listeners.borrow_mut());
        loop {
            let next = self.notices.borrow_mut().pop_front();
            let Some(notice) = next else { break };
            let event = notice.as_event();
            for listener in &mut current {
                listener(&event);
            }
            current.append(&mut self.listeners.borrow_mut());
        }
        self.emitting.set(false);

        let mut slot = self.listeners.borrow_mut();
        let added = mem::replace(&mut *slot, current);
        slot.extend(added);
    }

    fn submit(&self, task: impl Task + 'static, options: JobOptions) -> JobHandle {
        let id = JobId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let blocking = options.blocking;

        if blocking {
            if !self.announced.get() {
                self.announced.set(true);
                self.emit(Notice::Started);
            }
            self.blocking_jobs.set(self.blocking_jobs.get() + 1);
        }

        let (job, handle) = Job::new(id, Trampoline::new(task), options);
        debug!(
            scheduler = %self.name,
            job_id = %id,
            blocking,
            "job submitted"
        );
        self.pending.borrow_mut().push(job);
        handle
    }

    fn finish(&self, job: Job, outcome: JobOutcome) {
        if job.blocking {
            self.blocking_jobs.set(self.blocking_jobs.get() - 1);
        }
        debug!(
            scheduler = %self.name,
            job_id = %job.id,
            failed = matches!(outcome, JobOutcome::Failed(_)),
            "job finished"
        );
        job.finish(outcome);
    }
}

/// Cloneable submission endpoint.
///
/// Tasks that need to start further jobs hold a spawner; jobs submitted
/// mid-tick wait in the pending list until the scheduler's next merge.
#[derive(Clone)]
pub struct JobSpawner {
    shared: Rc<Shared>,
}

impl JobSpawner {
    /// Submit `task` as a new job. See [`JobScheduler::submit`].
    pub fn submit(&self, task: impl Task + 'static, options: JobOptions) -> JobHandle {
        self.shared.submit(task, options)
    }
}

impl fmt::Debug for JobSpawner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobSpawner")
            .field("scheduler", &self.shared.name)
            .finish()
    }
}

/// Runs jobs once per [`tick`](Self::tick).
pub struct JobScheduler {
    shared: Rc<Shared>,
    active: Vec<Job>,
    config: SchedulerConfig,
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                name: config.name.clone(),
                next_id: Cell::new(1),
                pending: RefCell::new(Vec::new()),
                blocking_jobs: Cell::new(0),
                announced: Cell::new(false),
                listeners: RefCell::new(Vec::new()),
                notices: RefCell::new(VecDeque::new()),
                emitting: Cell::new(false),
            }),
            active: Vec::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// A handle that can submit jobs without borrowing the scheduler.
    #[must_use]
    pub fn spawner(&self) -> JobSpawner {
        JobSpawner {
            shared: Rc::clone(&self.shared),
        }
    }

    /// Submit `task` as a new job.
    ///
    /// The job starts running on the next tick. If it is blocking and no
    /// blocking load is currently announced, listeners receive
    /// [`SchedulerEvent::BlockingLoadStarted`] before this returns, or right
    /// after the current notification when called from a listener.
    pub fn submit(&self, task: impl Task + 'static, options: JobOptions) -> JobHandle {
        self.shared.submit(task, options)
    }

    /// Register a listener for scheduler notifications.
    pub fn on_event(&self, listener: impl FnMut(&SchedulerEvent<'_>) + 'static) {
        self.shared.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Whether any pending or active job is blocking.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.shared.blocking_jobs.get() > 0
    }

    /// Status title of the first active blocking job.
    #[must_use]
    pub fn status_title(&self) -> Option<String> {
        self.active
            .iter()
            .find(|job| job.blocking)
            .and_then(Job::status_title)
    }

    /// Whether any job is pending or active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.active.is_empty() || !self.shared.pending.borrow().is_empty()
    }

    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.shared.pending.borrow().len()
    }

    /// Advance every active job by one step.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AsyncOperation`] when a job without an
    /// exception handler fails. The scheduler stays usable afterwards.
    pub fn tick(&mut self) -> Result<(), SchedulerError> {
        self.merge_pending();
        if self.active.is_empty() {
            return Ok(());
        }

        trace!(
            scheduler = %self.config.name,
            active = self.active.len(),
            "tick"
        );
        let result = self.advance_all();
        self.merge_pending();
        self.settle_blocking();
        result
    }

    fn merge_pending(&mut self) {
        let mut pending = self.shared.pending.borrow_mut();
        self.active.append(&mut pending);
    }

    fn advance_all(&mut self) -> Result<(), SchedulerError> {
        let mut jobs = mem::take(&mut self.active).into_iter();
        let mut survivors = Vec::with_capacity(jobs.len());

        while let Some(mut job) = jobs.next() {
            let error = match job.trampoline.advance() {
                Ok(true) => {
                    survivors.push(job);
                    continue;
                }
                Ok(false) => {
                    let value = job.trampoline.take_result();
                    self.shared.finish(job, JobOutcome::Completed(value));
                    continue;
                }
                Err(error) => error,
            };

            let message = error.cause().to_string();
            let handled = match job.on_exception.as_mut() {
                Some(handler) => {
                    warn!(
                        scheduler = %self.config.name,
                        job_id = %job.id,
                        error = %message,
                        "job failed, passing to its exception handler"
                    );
                    handler(&error);
                    true
                }
                None => false,
            };

            let id = job.id;
            self.shared.finish(job, JobOutcome::Failed(message.clone()));
            if handled {
                self.shared.emit(Notice::Exception {
                    job: id,
                    error: Rc::new(error),
                });
                continue;
            }

            error!(
                scheduler = %self.config.name,
                job_id = %id,
                error = %message,
                "unhandled job failure"
            );
            survivors.extend(jobs);
            self.active = survivors;
            return Err(SchedulerError::AsyncOperation { job: id, source: error });
        }

        self.active = survivors;
        Ok(())
    }

    fn settle_blocking(&mut self) {
        if self.shared.announced.get() && self.shared.blocking_jobs.get() == 0 {
            self.shared.announced.set(false);
            debug!(scheduler = %self.config.name, "blocking load complete");
            self.shared.emit(Notice::Complete);
        }
    }
}

impl fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobScheduler")
            .field("name", &self.config.name)
            .field("active", &self.active.len())
            .field("pending", &self.shared.pending.borrow().len())
            .field("blocking_jobs", &self.shared.blocking_jobs.get())
            .finish()
    }
}
