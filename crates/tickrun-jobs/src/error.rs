#![forbid(unsafe_code)]

//! Errors escaping [`JobScheduler::tick`](crate::JobScheduler::tick).

use thiserror::Error;
use tickrun_task::TaskError;

use crate::job::JobId;

/// A failure that escaped the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job failed and had no exception handler of its own.
    #[error("Error occurred during async operation")]
    AsyncOperation {
        job: JobId,
        #[source]
        source: TaskError,
    },
}

impl SchedulerError {
    /// The job the failure came from.
    #[must_use]
    pub fn job(&self) -> JobId {
        match self {
            Self::AsyncOperation { job, .. } => *job,
        }
    }

    /// The task failure underneath the scheduler tag.
    #[must_use]
    pub fn task_error(&self) -> &TaskError {
        match self {
            Self::AsyncOperation { source, .. } => source,
        }
    }

    /// Message suitable for showing to a user: the innermost cause, with
    /// the scheduler tag and any object trace stripped.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.task_error().cause().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickrun_task::ObjectTrace;

    #[test]
    fn user_message_unwraps_trace_and_tag() {
        let err = SchedulerError::AsyncOperation {
            job: JobId(3),
            source: TaskError::msg("Could not find project")
                .with_outer_trace(ObjectTrace::from_outermost(["Window", "Loader"])),
        };
        assert_eq!(err.to_string(), "Error occurred during async operation");
        assert_eq!(err.user_message(), "Could not find project");
        assert_eq!(err.job(), JobId(3));
        assert_eq!(
            err.task_error().object_trace().unwrap().as_slice(),
            &["Window", "Loader"]
        );
    }
}
