//! `passboard status`: persisted records, snapshot freshness and drift.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use passboard_core::{Record, ResolvedConfig, StoreLoad};
use passboard_sync::{
    drift::{check, DriftSignal},
    pipeline::renderer_for,
};

/// Arguments for `passboard status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, globals: &crate::GlobalArgs) -> Result<ExitCode> {
        let config = globals.resolve()?;
        let report = build_report(&config)?;
        if self.json {
            print_json(&report)?;
        } else {
            print_table(&report);
        }
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Debug)]
struct StatusReport {
    document: String,
    store: String,
    store_problem: Option<String>,
    records: Vec<Record>,
    snapshot_age: String,
    snapshot_at: Option<String>,
    signal: DriftSignal,
}

#[derive(Serialize)]
struct StatusReportJson<'a> {
    document: &'a str,
    store: &'a str,
    store_problem: Option<&'a str>,
    snapshot_age: &'a str,
    snapshot_at: Option<&'a str>,
    drift: &'static str,
    detail: String,
    records: &'a [Record],
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "secret")]
    secret: String,
    #[tabled(rename = "effective date")]
    effective_date: String,
}

fn build_report(config: &ResolvedConfig) -> Result<StatusReport> {
    let store = config.record_store();
    let (records, store_problem) = match store.load_or_empty() {
        StoreLoad::Loaded(records) => (records, None),
        StoreLoad::Missing | StoreLoad::Empty => (Vec::new(), None),
        StoreLoad::Malformed(err) => (Vec::new(), Some(err.to_string())),
    };

    let signal = if store_problem.is_some() {
        DriftSignal::RegionMissing {
            reason: "record store is unreadable".to_string(),
        }
    } else {
        let renderer = renderer_for(config).context("failed to load templates")?;
        check(config, &renderer)
            .with_context(|| format!("drift check failed for {}", config.document.display()))?
    };

    let watermark = store.watermark();
    Ok(StatusReport {
        document: config.document.display().to_string(),
        store: config.store.display().to_string(),
        store_problem,
        records,
        snapshot_age: watermark.age(),
        snapshot_at: watermark.as_datetime().map(|t| t.to_rfc3339()),
        signal,
    })
}

fn print_json(report: &StatusReport) -> Result<()> {
    let payload = StatusReportJson {
        document: &report.document,
        store: &report.store,
        store_problem: report.store_problem.as_deref(),
        snapshot_age: &report.snapshot_age,
        snapshot_at: report.snapshot_at.as_deref(),
        drift: signal_key(&report.signal),
        detail: signal_detail(&report.signal),
        records: &report.records,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: &StatusReport) {
    println!(
        "passboard v{} | {} record(s) | snapshot {} | {} {}",
        env!("CARGO_PKG_VERSION"),
        report.records.len(),
        if report.snapshot_at.is_some() {
            format!("{} ago", report.snapshot_age)
        } else {
            report.snapshot_age.clone()
        },
        signal_indicator(&report.signal),
        report.signal.label().to_uppercase(),
    );
    println!("  page:  {}", report.document);
    println!("  store: {}", report.store);
    if let Some(problem) = &report.store_problem {
        println!("  {} {problem}", "!".yellow());
    }

    if report.records.is_empty() {
        println!("No records persisted yet.");
    } else {
        let rows: Vec<RecordRow> = report
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| RecordRow {
                position: i + 1,
                name: r.name.clone(),
                secret: r.secret.clone(),
                effective_date: r.effective_date.clone(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    match &report.signal {
        DriftSignal::Drifted => println!("Run 'passboard diff' to see how the page differs."),
        DriftSignal::RegionMissing { reason } => println!("{reason}"),
        DriftSignal::NeverPublished | DriftSignal::Current => {}
    }
}

fn signal_key(signal: &DriftSignal) -> &'static str {
    match signal {
        DriftSignal::NeverPublished => "never_published",
        DriftSignal::Current => "current",
        DriftSignal::Drifted => "drifted",
        DriftSignal::RegionMissing { .. } => "region_missing",
    }
}

fn signal_indicator(signal: &DriftSignal) -> String {
    match signal {
        DriftSignal::NeverPublished => "■".bright_black().bold().to_string(),
        DriftSignal::Current => "■".green().bold().to_string(),
        DriftSignal::Drifted => "■".yellow().bold().to_string(),
        DriftSignal::RegionMissing { .. } => "■".red().bold().to_string(),
    }
}

fn signal_detail(signal: &DriftSignal) -> String {
    match signal {
        DriftSignal::NeverPublished => "no record store yet".to_string(),
        DriftSignal::Current => "page matches the record store".to_string(),
        DriftSignal::Drifted => "page listing differs from the record store".to_string(),
        DriftSignal::RegionMissing { reason } => reason.clone(),
    }
}
