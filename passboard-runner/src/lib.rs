//! Retry loop and process runtime for continuous mode.

mod error;
pub mod retry;
mod runtime;

pub use error::RunnerError;
pub use retry::{backoff_after, drive, DriveOutcome, DriveReport, RetryPolicy};
pub use runtime::{init_tracing, run_continuous, start_blocking, LogFormat};
