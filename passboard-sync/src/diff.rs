//! Dry-run unified diff support for `passboard diff`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use similar::TextDiff;

use passboard_core::ResolvedConfig;
use passboard_renderer::Renderer;

use crate::error::{io_err, SyncError};

/// Pending change to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Render what publishing the persisted dataset would produce and compare it
/// to the document on disk. `None` when they already match.
///
/// No files are written.
pub fn diff_document(config: &ResolvedConfig, renderer: &Renderer) -> Result<Option<DocumentDiff>, SyncError> {
    let records = config.record_store().load()?;
    let existing = read_existing_or_empty(&config.document)?;
    let rendered = renderer.render_document(&existing, &records)?;
    if existing == rendered {
        return Ok(None);
    }

    let relative = config
        .document
        .strip_prefix(&config.base_dir)
        .unwrap_or(config.document.as_path());
    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    let unified = TextDiff::from_lines(&existing, &rendered)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();

    Ok(Some(DocumentDiff {
        path: config.document.clone(),
        unified_diff: unified,
    }))
}

fn read_existing_or_empty(path: &Path) -> Result<String, SyncError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(io_err(path, err)),
    }
}
