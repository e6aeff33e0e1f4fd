//! One refresh cycle: extract, check freshness, reconcile, publish.
//!
//! ## Cycle steps
//!
//! 1. Read the snapshot watermark.
//! 2. Run the extractor. Errors and panics end the cycle.
//! 3. Re-read the watermark; no advance means the batch is stale.
//! 4. Load the persisted baseline (missing or malformed → empty, with a
//!    warning; `strict_baseline` ends the cycle instead).
//! 5. Reconcile and log the change report.
//! 6. No added or updated names → done, nothing written.
//! 7. Publish.

use std::panic::{catch_unwind, AssertUnwindSafe};

use passboard_core::types::{ChangeReport, PriorityOrder, Record};
use passboard_core::{ResolvedConfig, StoreLoad};
use passboard_renderer::Renderer;

use crate::error::ExtractError;
use crate::extract::Extractor;
use crate::publish::{publish, PublishMode, PublishReceipt, PublishTarget};
use crate::reconcile::reconcile;

/// How a cycle ended. Only [`CycleOutcome::Published`] counts as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    ExtractionFailed { reason: String },
    /// The watermark did not advance during extraction.
    Stale,
    /// `strict_baseline` is set and the store was missing, empty or malformed.
    EmptyBaseline { reason: String },
    NoChanges { report: ChangeReport },
    Published { report: ChangeReport, receipt: PublishReceipt },
    PublishFailed { phase: &'static str, reason: String },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Published { .. })
    }

    pub fn report(&self) -> Option<&ChangeReport> {
        match self {
            CycleOutcome::NoChanges { report } | CycleOutcome::Published { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Short label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::ExtractionFailed { .. } => "extraction failed",
            CycleOutcome::Stale => "stale",
            CycleOutcome::EmptyBaseline { .. } => "empty baseline",
            CycleOutcome::NoChanges { .. } => "no changes",
            CycleOutcome::Published { .. } => "published",
            CycleOutcome::PublishFailed { .. } => "publish failed",
        }
    }
}

/// Drives single cycles against one configured target.
pub struct Orchestrator<E> {
    extractor: E,
    renderer: Renderer,
    target: PublishTarget,
    priority: PriorityOrder,
    strict_baseline: bool,
    mode: PublishMode,
}

impl<E: Extractor> Orchestrator<E> {
    pub fn new(extractor: E, renderer: Renderer, config: &ResolvedConfig) -> Self {
        Orchestrator {
            extractor,
            renderer,
            target: PublishTarget::from_config(config),
            priority: config.priority.clone(),
            strict_baseline: config.strict_baseline,
            mode: PublishMode::Write,
        }
    }

    pub fn with_mode(mut self, mode: PublishMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run one cycle and report `true` only when a publish happened.
    pub fn run_cycle(&mut self) -> bool {
        self.cycle().is_success()
    }

    /// Run one cycle.
    pub fn cycle(&mut self) -> CycleOutcome {
        let store = &self.target.store;
        let before = store.watermark();

        let raw = match catch_unwind(AssertUnwindSafe(|| self.extractor.extract())) {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => return extraction_failed(err),
            Err(payload) => return extraction_failed(ExtractError::Panicked(panic_message(payload.as_ref()))),
        };

        let after = store.watermark();
        if !after.is_fresher_than(&before) {
            tracing::warn!("stale data: snapshot not updated (last update {} ago)", after.age());
            return CycleOutcome::Stale;
        }

        let persisted = match self.load_baseline() {
            Ok(records) => records,
            Err(reason) => return CycleOutcome::EmptyBaseline { reason },
        };

        let incoming: Vec<Record> = raw.into_iter().map(|r| r.into_record()).collect();
        let reconciled = reconcile(&incoming, &persisted, &self.priority);
        let report = reconciled.report;
        tracing::info!(
            "reconciled: {} added, {} updated, {} unchanged",
            report.added_count(),
            report.updated_count(),
            report.unchanged_count()
        );
        if !report.added.is_empty() {
            tracing::info!("added: {}", report.added.join(", "));
        }
        if !report.updated.is_empty() {
            tracing::info!("updated: {}", report.updated.join(", "));
        }

        if !report.has_changes() {
            tracing::info!("no changes; skipping publish");
            return CycleOutcome::NoChanges { report };
        }

        match publish(&self.target, &reconciled.merged, &self.renderer, self.mode) {
            Ok(receipt) => {
                tracing::info!(
                    "published {} record(s) to {}",
                    receipt.records,
                    receipt.document.path().display()
                );
                CycleOutcome::Published { report, receipt }
            }
            Err(err) => {
                tracing::error!("publish failed during {}: {err}", err.phase());
                CycleOutcome::PublishFailed {
                    phase: err.phase(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn load_baseline(&self) -> Result<Vec<Record>, String> {
        let path = self.target.store.dataset_path();
        let problem = match self.target.store.load_or_empty() {
            StoreLoad::Loaded(records) => return Ok(records),
            StoreLoad::Missing => format!("record store {} does not exist", path.display()),
            StoreLoad::Empty => format!("record store {} is empty", path.display()),
            StoreLoad::Malformed(err) => format!("record store unreadable: {err}"),
        };
        if self.strict_baseline {
            tracing::warn!("{problem}; strict_baseline is set, ending cycle");
            Err(problem)
        } else {
            tracing::warn!("{problem}; continuing with an empty baseline");
            Ok(Vec::new())
        }
    }
}

fn extraction_failed(err: ExtractError) -> CycleOutcome {
    tracing::error!("extraction failed: {err}");
    CycleOutcome::ExtractionFailed {
        reason: err.to_string(),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
