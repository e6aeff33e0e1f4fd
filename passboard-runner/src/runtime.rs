//! Process-level runtime: tracing setup, ctrl-c handling, blocking entrypoint.

use tokio::sync::broadcast;

use passboard_core::ResolvedConfig;
use passboard_sync::{pipeline, PublishMode};

use crate::error::{io_err, RunnerError};
use crate::retry::{drive, DriveReport, RetryPolicy};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global subscriber once at process start.
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Output goes to stderr
/// so command output on stdout stays machine-readable. Records emitted through
/// the `log` facade by the library crates are bridged in.
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Drive `cycle` under `policy`, stopping early on ctrl-c.
pub async fn run_continuous<C>(policy: RetryPolicy, cycle: C) -> DriveReport
where
    C: FnMut() -> bool + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("received ctrl-c, stopping after the current attempt");
                    let _ = shutdown.send(());
                }
                Err(err) => tracing::warn!("ctrl-c handler failed: {err}"),
            }
        })
    };

    let report = drive(policy, cycle, shutdown_rx).await;
    signal_handle.abort();
    drop(shutdown_tx);
    tracing::info!(
        "retry loop finished: {} after {} attempt(s), {} sleep(s)",
        report.outcome,
        report.attempts,
        report.sleeps
    );
    report
}

/// Build the configured pipeline and run the retry loop on a current-thread
/// runtime, blocking until it ends.
pub fn start_blocking(config: &ResolvedConfig, policy: RetryPolicy, mode: PublishMode) -> Result<DriveReport, RunnerError> {
    let mut orchestrator = pipeline::build(config, mode)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    Ok(runtime.block_on(run_continuous(policy, move || orchestrator.run_cycle())))
}
