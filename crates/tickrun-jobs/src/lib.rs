#![forbid(unsafe_code)]

//! Tick-driven job scheduler.
//!
//! A [`JobScheduler`] owns any number of jobs, each a task flattened by a
//! [`Trampoline`](tickrun_task::Trampoline), and advances every one of them
//! by a single step per [`tick`](JobScheduler::tick). Jobs are classified
//! as blocking or not; listeners hear when a blocking load starts and when
//! it completes, and when a job fails into its own exception handler.
//!
//! # Example
//!
//! ```
//! use tickrun_jobs::{JobOptions, JobScheduler};
//! use tickrun_task::wait_ticks;
//!
//! let mut scheduler = JobScheduler::new();
//! let handle = scheduler.submit(wait_ticks(1), JobOptions::non_blocking());
//! scheduler.tick().unwrap();
//! assert!(!handle.is_finished());
//! scheduler.tick().unwrap();
//! assert!(handle.is_finished());
//! ```

pub mod error;
pub mod job;
pub mod scheduler;

pub use error::SchedulerError;
pub use job::{ExceptionHandler, JobHandle, JobId, JobOptions, JobOutcome, WaitForJob};
pub use scheduler::{JobScheduler, JobSpawner, SchedulerConfig, SchedulerEvent};
