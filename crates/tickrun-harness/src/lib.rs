#![forbid(unsafe_code)]

//! Composition root for the tickrun runtime.
//!
//! [`Harness`] owns the job scheduler, the event dispatcher and the frame
//! counter that next-frame events are measured against, and drives all
//! three from one [`tick`](Harness::tick). Tests and small hosts use it
//! directly; larger hosts can copy its wiring.

pub mod error;
pub mod harness;

pub use error::HarnessError;
pub use harness::{Harness, HarnessConfig, ReportedError};

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a `fmt` subscriber on stdout, filtered by `RUST_LOG` (default
/// `warn`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init();
}

/// Like [`init_logging`], but writes through the test harness so output is
/// captured per test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}
