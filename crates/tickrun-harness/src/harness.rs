#![forbid(unsafe_code)]

//! One scheduler, one dispatcher and one frame counter behind a single
//! `tick()`.
//!
//! # Design
//!
//! A host calls [`Harness::tick`] once per frame. The tick advances every
//! job, then flushes queued events, then moves the frame counter on, so
//! events fired by jobs are delivered in the same frame and next-frame
//! events see the frame change before the following flush.
//!
//! # Failure Modes
//!
//! - **Unhandled job failure**: `tick()` returns the error after moving the
//!   frame counter on; the event flush of that frame is skipped and queued
//!   events wait for the next tick.
//! - **Handled job failure**: recorded and readable through
//!   [`Harness::reported_errors`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tickrun_events::{DispatcherConfig, EventDispatcher, TickCounter};
use tickrun_jobs::{
    JobHandle, JobId, JobOptions, JobScheduler, JobSpawner, SchedulerConfig, SchedulerEvent,
};
use tickrun_task::Task;
use tracing::{debug, info};

use crate::error::HarnessError;

/// Harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Upper bound on ticks spent in [`Harness::run_until_idle`].
    pub max_ticks: u64,
    pub scheduler: SchedulerConfig,
    pub dispatcher: DispatcherConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_ticks: 10_000,
            scheduler: SchedulerConfig::default(),
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl HarnessConfig {
    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    #[must_use]
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
        self.dispatcher = dispatcher;
        self
    }
}

/// A handled job failure, as broadcast by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub job: JobId,
    pub message: String,
}

/// Composition root for the tick-driven runtime.
pub struct Harness {
    scheduler: JobScheduler,
    events: EventDispatcher,
    frames: TickCounter,
    reported: Rc<RefCell<Vec<ReportedError>>>,
    config: HarnessConfig,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HarnessConfig::default())
    }

    #[must_use]
    pub fn with_config(config: HarnessConfig) -> Self {
        let frames = TickCounter::new();
        let events =
            EventDispatcher::with_config(config.dispatcher.clone()).with_frame_counter(frames.clone());
        let scheduler = JobScheduler::with_config(config.scheduler.clone());

        let reported = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reported);
        scheduler.on_event(move |event| {
            if let SchedulerEvent::Exception { job, error } = event {
                sink.borrow_mut().push(ReportedError {
                    job: *job,
                    message: error.cause().to_string(),
                });
            }
        });

        Self {
            scheduler,
            events,
            frames,
            reported,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    #[must_use]
    pub fn scheduler(&self) -> &JobScheduler {
        &self.scheduler
    }

    /// Shared handle to the dispatcher.
    #[must_use]
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    #[must_use]
    pub fn frames(&self) -> &TickCounter {
        &self.frames
    }

    #[must_use]
    pub fn spawner(&self) -> JobSpawner {
        self.scheduler.spawner()
    }

    /// Submit `task` to the scheduler.
    pub fn submit(&self, task: impl Task + 'static, options: JobOptions) -> JobHandle {
        self.scheduler.submit(task, options)
    }

    /// Run one frame: advance jobs, flush events, move to the next frame.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Scheduler`] when a job without an exception
    /// handler failed during this tick.
    pub fn tick(&mut self) -> Result<(), HarnessError> {
        let result = self.scheduler.tick();
        if result.is_ok() {
            self.events.flush();
        }
        self.frames.advance();
        result.map_err(HarnessError::from)
    }

    /// Whether any job is running or any event waits for a flush.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.scheduler.is_running() && self.events.queued_len() == 0
    }

    /// Tick until [`is_idle`](Self::is_idle), returning the ticks spent.
    ///
    /// # Errors
    ///
    /// Fails on the first unhandled job failure, or with
    /// [`HarnessError::TickLimit`] once `max_ticks` ticks have passed.
    pub fn run_until_idle(&mut self) -> Result<u64, HarnessError> {
        let mut ticks = 0;
        while !self.is_idle() {
            if ticks == self.config.max_ticks {
                return Err(HarnessError::TickLimit { ticks });
            }
            self.tick()?;
            ticks += 1;
        }
        debug!(ticks, "harness idle");
        Ok(ticks)
    }

    /// Tick until `job` has finished, returning the ticks spent.
    ///
    /// # Errors
    ///
    /// Same as [`run_until_idle`](Self::run_until_idle).
    pub fn run_until_finished(&mut self, job: &JobHandle) -> Result<u64, HarnessError> {
        let mut ticks = 0;
        while !job.is_finished() {
            if ticks == self.config.max_ticks {
                return Err(HarnessError::TickLimit { ticks });
            }
            self.tick()?;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Handled job failures seen so far, oldest first.
    #[must_use]
    pub fn reported_errors(&self) -> Vec<ReportedError> {
        self.reported.borrow().clone()
    }

    /// Tear down, checking that every subscription was removed.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Leaked`] naming the remaining subscriptions.
    pub fn shutdown(self) -> Result<(), HarnessError> {
        self.events.check_empty()?;
        info!(frames = self.frames.get(), "harness shut down");
        Ok(())
    }
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("frame", &self.frames.get())
            .field("scheduler", &self.scheduler)
            .field("events", &self.events)
            .finish()
    }
}
