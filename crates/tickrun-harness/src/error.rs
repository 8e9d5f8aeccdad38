#![forbid(unsafe_code)]

use thiserror::Error;
use tickrun_events::EventError;
use tickrun_jobs::SchedulerError;

/// Errors surfaced by the [`Harness`](crate::Harness).
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// `run_until_idle` gave up.
    #[error("still busy after {ticks} ticks")]
    TickLimit { ticks: u64 },

    /// Subscriptions outlived the harness.
    #[error(transparent)]
    Leaked(#[from] EventError),
}

impl HarnessError {
    /// Text fit for an error dialog.
    ///
    /// Scheduler failures show the innermost cause rather than the generic
    /// async-operation wrapper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Scheduler(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
