#![forbid(unsafe_code)]

//! tickrun public facade crate.
//!
//! Re-exports the task, job, event and harness crates, plus a prelude with
//! the names most hosts need.

pub use tickrun_events as events;
pub use tickrun_harness as harness;
pub use tickrun_jobs as jobs;
pub use tickrun_task as task;

pub mod prelude {
    pub use tickrun_events::{
        DispatcherConfig, EventDispatcher, EventError, EventQueueMode, EventSink, FrameCounter,
        HandlerKey, SenderId, SubscriberId, TickCounter,
    };
    pub use tickrun_harness::{
        Harness, HarnessConfig, HarnessError, ReportedError, init_logging, init_test_logging,
    };
    pub use tickrun_jobs::{
        JobHandle, JobId, JobOptions, JobOutcome, JobScheduler, JobSpawner, SchedulerConfig,
        SchedulerError, SchedulerEvent,
    };
    pub use tickrun_task::{
        BoxTask, ObjectTrace, Step, Task, TaskError, TaskExt, TaskResult, Trampoline, Typed, Value,
        from_fn, parallel, ready, sequence, sync_wait, sync_wait_get, sync_wait_with_timeout,
        wait_for, wait_ticks, wrap,
    };
}
