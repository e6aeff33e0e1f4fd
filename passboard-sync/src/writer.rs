//! Atomic document writer.
//!
//! ## `atomic_write` protocol
//!
//! 1. Compare the new content with what is on disk → skip if identical.
//! 2. Stage to `<path>.passboard.tmp` in the same directory.
//! 3. Rename over the final path (atomic on POSIX).
//! 4. On rename failure, remove the tmp file and leave the original intact.
//!
//! Steps 2 to 4 are [`passboard_core::atomic`], the same primitive the record
//! store uses.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use passboard_core::{atomic, WriteError};

use crate::error::{io_err, SyncError};

pub use passboard_core::atomic::tmp_path_for;

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// File was skipped; content already matches.
    Unchanged { path: PathBuf },
    /// Dry-run mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// Atomically replace `path` with `content`.
pub fn atomic_write(path: &Path, content: &str, dry_run: bool) -> Result<WriteResult, SyncError> {
    atomic_write_with_tmp(path, content, dry_run, &tmp_path_for(path))
}

fn atomic_write_with_tmp(path: &Path, content: &str, dry_run: bool, tmp: &Path) -> Result<WriteResult, SyncError> {
    match std::fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(io_err(path, err)),
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    atomic::stage_at(path, tmp, content.as_bytes())
        .and_then(|staged| staged.commit())
        .map_err(|WriteError { path, source }| io_err(path, source))?;

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
