//! passboard: keep a published listing in step with an extracted dataset.
//!
//! # Usage
//!
//! ```text
//! passboard init [--command <cmd>] [--page]
//! passboard run [--dry-run]
//! passboard run --continuous [--interval <secs>] [--max-attempts <n|unbounded>] [--dry-run]
//! passboard status [--json]
//! passboard diff
//! ```
//!
//! Global flags: `--base-dir <dir>` (default `.`), `--config <file>`,
//! `--log-json`.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{diff::DiffArgs, init::InitArgs, run::RunArgs, status::StatusArgs};
use passboard_core::{Config, ResolvedConfig};
use passboard_runner::LogFormat;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "passboard",
    version,
    about = "Reconcile an extracted record set and publish it into a page",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    globals: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default passboard.yaml and the output directory.
    Init(InitArgs),

    /// Run one refresh cycle, or keep retrying with --continuous.
    Run(RunArgs),

    /// Show the persisted records, snapshot age and drift.
    Status(StatusArgs),

    /// Show a unified diff of what publishing would change in the page.
    Diff(DiffArgs),
}

/// Flags shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Base directory; relative config paths resolve against it.
    #[arg(long, global = true, default_value = ".")]
    pub base_dir: PathBuf,

    /// Config file (default: <base-dir>/passboard.yaml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    /// Path of the config file in effect.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| Config::path_in(&self.base_dir))
    }

    /// Load and resolve configuration once for this invocation.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let config = Config::load_at(&self.base_dir, self.config.as_deref())
            .with_context(|| format!("failed to load {}", self.config_path().display()))?;
        config
            .resolve(&self.base_dir)
            .with_context(|| format!("invalid configuration in {}", self.config_path().display()))
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    passboard_runner::init_tracing(if cli.globals.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    let globals = cli.globals;
    let result = match cli.command {
        Commands::Init(args) => args.run(&globals),
        Commands::Run(args) => args.run(&globals),
        Commands::Status(args) => args.run(&globals),
        Commands::Diff(args) => args.run(&globals),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
