//! `passboard run`: one refresh cycle, or the retry loop with `--continuous`.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use passboard_core::MaxAttempts;
use passboard_runner::{start_blocking, DriveOutcome, RetryPolicy};
use passboard_sync::{pipeline, BackupOutcome, CycleOutcome, PublishMode, WriteResult};

use crate::GlobalArgs;

/// Arguments for `passboard run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Keep retrying until a cycle publishes or attempts run out.
    #[arg(long)]
    pub continuous: bool,

    /// Seconds between attempt starts (overrides retry_interval_secs).
    #[arg(long, value_name = "SECS", requires = "continuous")]
    pub interval: Option<u64>,

    /// Attempt budget, a positive number or `unbounded` (overrides max_attempts).
    #[arg(long, value_name = "N|unbounded", requires = "continuous")]
    pub max_attempts: Option<MaxAttempts>,

    /// Extract and reconcile, but write neither the store nor the page.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn run(self, globals: &GlobalArgs) -> Result<ExitCode> {
        let config = globals.resolve()?;
        let mode = if self.dry_run {
            PublishMode::DryRun
        } else {
            PublishMode::Write
        };

        if !self.continuous {
            let outcome = pipeline::run_once(&config, mode).context("could not start the cycle")?;
            print_outcome(&outcome);
            return Ok(exit_code(outcome.is_success()));
        }

        let mut policy = RetryPolicy::from_config(&config);
        if let Some(secs) = self.interval {
            policy.interval = Duration::from_secs(secs);
        }
        if let Some(max) = self.max_attempts {
            policy.max_attempts = max;
        }

        let report = start_blocking(&config, policy, mode).context("retry loop failed")?;
        let summary = format!(
            "{} after {} attempt(s), {} sleep(s)",
            report.outcome, report.attempts, report.sleeps
        );
        match report.outcome {
            DriveOutcome::Success => println!("{} {summary}", "✓".green()),
            DriveOutcome::Exhausted => println!("{} {summary}", "✗".red()),
            DriveOutcome::Interrupted => println!("{} {summary}", "■".yellow()),
        }
        Ok(exit_code(report.is_success()))
    }
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Published { report, receipt } => {
            let prefix = if receipt.is_dry_run() { "[dry-run] " } else { "" };
            let verb = if receipt.is_dry_run() { "would publish" } else { "published" };
            println!(
                "{prefix}{} {verb} {} record(s) ({} added, {} updated, {} unchanged)",
                "✓".green(),
                receipt.records,
                report.added_count(),
                report.updated_count(),
                report.unchanged_count()
            );
            for name in &report.added {
                println!("  + {name}");
            }
            for name in &report.updated {
                println!("  ~ {name}");
            }
            println!("  page: {}", describe_write(&receipt.document));
            match &receipt.backup {
                BackupOutcome::Written { path } => println!("  backup: {}", path.display()),
                BackupOutcome::Skipped => {}
                BackupOutcome::Failed { path, reason } => {
                    println!("  {} backup {} failed: {reason}", "!".yellow(), path.display())
                }
            }
        }
        CycleOutcome::NoChanges { report } => {
            println!(
                "• no changes ({} unchanged); nothing published",
                report.unchanged_count()
            );
        }
        CycleOutcome::Stale => println!("{} stale: the snapshot was not refreshed", "■".yellow()),
        CycleOutcome::EmptyBaseline { reason } => {
            println!("{} empty baseline: {reason}", "■".yellow())
        }
        CycleOutcome::ExtractionFailed { reason } => {
            println!("{} extraction failed: {reason}", "✗".red())
        }
        CycleOutcome::PublishFailed { phase, reason } => {
            println!("{} publish failed during {phase}: {reason}", "✗".red())
        }
    }
}

fn describe_write(result: &WriteResult) -> String {
    match result {
        WriteResult::Written { path } => format!("wrote {}", path.display()),
        WriteResult::Unchanged { path } => format!("{} unchanged", path.display()),
        WriteResult::WouldWrite { path } => format!("would write {}", path.display()),
    }
}
