//! Retry loop: run cycles until one succeeds or the attempt budget is spent.
//!
//! Cycles are blocking and run one at a time on the blocking pool. The only
//! await between them is the inter-attempt sleep, which a shutdown broadcast
//! cuts short.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

use passboard_core::{MaxAttempts, ResolvedConfig};

/// Attempt budget and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: MaxAttempts,
    /// Target spacing between attempt starts.
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: MaxAttempts, interval: Duration) -> Self {
        RetryPolicy { max_attempts, interval }
    }

    /// A single attempt, no sleeping.
    pub fn once() -> Self {
        RetryPolicy::new(MaxAttempts::ONCE, Duration::ZERO)
    }

    pub fn from_config(config: &ResolvedConfig) -> Self {
        RetryPolicy::new(config.max_attempts, config.retry_interval)
    }
}

/// Terminal state of [`drive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    Success,
    Exhausted,
    Interrupted,
}

impl fmt::Display for DriveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveOutcome::Success => write!(f, "success"),
            DriveOutcome::Exhausted => write!(f, "exhausted"),
            DriveOutcome::Interrupted => write!(f, "interrupted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveReport {
    pub outcome: DriveOutcome,
    pub attempts: u32,
    pub sleeps: u32,
}

impl DriveReport {
    pub fn is_success(&self) -> bool {
        self.outcome == DriveOutcome::Success
    }
}

/// Sleep owed after an attempt that took `elapsed`.
pub fn backoff_after(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Run `cycle` under `policy` until it returns `true`, the budget runs out, or
/// `shutdown` fires during a sleep.
///
/// A panicking cycle counts as `false`. A closed shutdown channel is treated
/// as "never interrupt".
pub async fn drive<C>(policy: RetryPolicy, cycle: C, mut shutdown: broadcast::Receiver<()>) -> DriveReport
where
    C: FnMut() -> bool + Send + 'static,
{
    let cycle = Arc::new(Mutex::new(cycle));
    let mut shutdown_open = true;
    let mut attempts: u32 = 0;
    let mut sleeps: u32 = 0;

    loop {
        attempts = attempts.saturating_add(1);
        tracing::info!("attempt {attempts} of {}", policy.max_attempts);
        let started = Instant::now();

        let ok = run_attempt(cycle.clone()).await;
        if ok {
            tracing::info!("attempt {attempts} succeeded");
            return DriveReport {
                outcome: DriveOutcome::Success,
                attempts,
                sleeps,
            };
        }

        if !policy.max_attempts.allows_after(attempts) {
            tracing::warn!("giving up after {attempts} attempt(s)");
            return DriveReport {
                outcome: DriveOutcome::Exhausted,
                attempts,
                sleeps,
            };
        }

        let pause = backoff_after(policy.interval, started.elapsed());
        tracing::info!("attempt {attempts} failed; retrying in {:.1}s", pause.as_secs_f64());
        sleeps += 1;
        if sleep_or_shutdown(pause, &mut shutdown, &mut shutdown_open).await {
            tracing::info!("shutdown requested; stopping after {attempts} attempt(s)");
            return DriveReport {
                outcome: DriveOutcome::Interrupted,
                attempts,
                sleeps,
            };
        }
    }
}

async fn run_attempt<C>(cycle: Arc<Mutex<C>>) -> bool
where
    C: FnMut() -> bool + Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || {
        // A previous panic poisons the lock; the cycle itself is still usable.
        let mut guard = cycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        (*guard)()
    })
    .await;
    match joined {
        Ok(ok) => ok,
        Err(err) => {
            tracing::error!("cycle aborted: {err}");
            false
        }
    }
}

/// `true` when shutdown arrived before `pause` elapsed.
async fn sleep_or_shutdown(pause: Duration, shutdown: &mut broadcast::Receiver<()>, open: &mut bool) -> bool {
    let deadline = Instant::now() + pause;
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return false,
            received = shutdown.recv(), if *open => match received {
                Ok(()) | Err(RecvError::Lagged(_)) => return true,
                Err(RecvError::Closed) => *open = false,
            },
        }
    }
}
