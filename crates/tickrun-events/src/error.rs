#![forbid(unsafe_code)]

//! Dispatcher errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Subscriptions were still registered at teardown.
    #[error("Found {count} events still registered: {}", .keys.join(", "))]
    Leaked { count: usize, keys: Vec<String> },
}
