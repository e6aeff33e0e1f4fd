//! Publisher: persist the merged dataset and rewrite the document.
//!
//! ## Order of operations
//!
//! 1. Read the document and render the rewritten version in memory. A missing
//!    or ambiguous listing region fails here, before anything is written.
//! 2. Stage the merged dataset next to the record store (validated, not yet
//!    visible).
//! 3. Copy the current document to `<document>.bak` (best effort).
//! 4. Atomically replace the document.
//! 5. Commit the staged dataset.
//!
//! The store only moves once the document holds the same data. A failed
//! document write leaves the old dataset in place, so the next cycle sees the
//! same changes again and republishes.

use std::path::{Path, PathBuf};

use passboard_core::types::Record;
use passboard_core::{RecordStore, ResolvedConfig, StoreError};
use passboard_renderer::Renderer;

use crate::error::{io_err, SyncError};
use crate::writer::{atomic_write, WriteResult};

/// Where a publish writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub store: RecordStore,
    pub document: PathBuf,
    pub backup: PathBuf,
}

impl PublishTarget {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        PublishTarget {
            store: config.record_store(),
            document: config.document.clone(),
            backup: config.backup.clone(),
        }
    }
}

/// Whether a publish touches the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishMode {
    #[default]
    Write,
    DryRun,
}

impl PublishMode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, PublishMode::DryRun)
    }
}

/// What happened to the backup copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Written { path: PathBuf },
    /// Dry run; nothing copied.
    Skipped,
    /// The copy failed. The publish went ahead regardless.
    Failed { path: PathBuf, reason: String },
}

/// Summary of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub store: WriteResult,
    pub backup: BackupOutcome,
    pub document: WriteResult,
    pub records: usize,
}

impl PublishReceipt {
    pub fn is_dry_run(&self) -> bool {
        matches!(self.document, WriteResult::WouldWrite { .. })
            || matches!(self.store, WriteResult::WouldWrite { .. })
    }
}

/// Publish `merged` to the store and the document.
///
/// Succeeds only when both the store and the document were written. A failed
/// backup is logged and recorded in the receipt.
pub fn publish(
    target: &PublishTarget,
    merged: &[Record],
    renderer: &Renderer,
    mode: PublishMode,
) -> Result<PublishReceipt, SyncError> {
    let current = read_document(&target.document)?;
    let rendered = renderer.render_document(&current, merged)?;

    if mode.is_dry_run() {
        let document = atomic_write(&target.document, &rendered, true)?;
        tracing::info!(
            "[dry-run] would save {} record(s) to {}",
            merged.len(),
            target.store.dataset_path().display()
        );
        return Ok(PublishReceipt {
            store: WriteResult::WouldWrite {
                path: target.store.dataset_path().to_path_buf(),
            },
            backup: BackupOutcome::Skipped,
            document,
            records: merged.len(),
        });
    }

    let staged = target.store.stage_save(merged)?;
    let backup = write_backup(&target.backup, &current);
    let document = atomic_write(&target.document, &rendered, false)?;
    staged.commit().map_err(StoreError::from)?;
    tracing::info!(
        "saved {} record(s) to {}",
        merged.len(),
        target.store.dataset_path().display()
    );

    Ok(PublishReceipt {
        store: WriteResult::Written {
            path: target.store.dataset_path().to_path_buf(),
        },
        backup,
        document,
        records: merged.len(),
    })
}

fn read_document(path: &Path) -> Result<String, SyncError> {
    std::fs::read_to_string(path).map_err(|e| io_err(path, e))
}

fn write_backup(path: &Path, content: &str) -> BackupOutcome {
    match atomic_write(path, content, false) {
        Ok(result) => {
            tracing::info!("backup: {}", path.display());
            BackupOutcome::Written {
                path: result.path().to_path_buf(),
            }
        }
        Err(err) => {
            tracing::warn!("backup failed, continuing: {err}");
            BackupOutcome::Failed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
