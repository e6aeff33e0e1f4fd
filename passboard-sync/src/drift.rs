//! Drift detection for `passboard status`.
//!
//! Signal precedence:
//! 1. `NeverPublished` (record store missing)
//! 2. `RegionMissing` (document absent or its listing region unusable)
//! 3. `Drifted` (region differs from what the persisted dataset renders to)
//! 4. `Current`

use std::io::ErrorKind;

use passboard_core::ResolvedConfig;
use passboard_renderer::Renderer;

use crate::error::{io_err, SyncError};

/// Relationship between the document and the persisted dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriftSignal {
    NeverPublished,
    Current,
    Drifted,
    RegionMissing { reason: String },
}

impl DriftSignal {
    pub fn label(&self) -> &'static str {
        match self {
            DriftSignal::NeverPublished => "never published",
            DriftSignal::Current => "current",
            DriftSignal::Drifted => "drifted",
            DriftSignal::RegionMissing { .. } => "region missing",
        }
    }
}

/// Check the configured document against the record store.
pub fn check(config: &ResolvedConfig, renderer: &Renderer) -> Result<DriftSignal, SyncError> {
    let store = config.record_store();
    if !store.exists() {
        return Ok(DriftSignal::NeverPublished);
    }
    let records = store.load()?;

    let document = match std::fs::read_to_string(&config.document) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Ok(DriftSignal::RegionMissing {
                reason: format!("document {} does not exist", config.document.display()),
            });
        }
        Err(err) => return Err(io_err(&config.document, err)),
    };

    match renderer.render_document(&document, &records) {
        Ok(rendered) if rendered == document => Ok(DriftSignal::Current),
        Ok(_) => Ok(DriftSignal::Drifted),
        Err(err) if err.is_structural() => Ok(DriftSignal::RegionMissing {
            reason: err.to_string(),
        }),
        Err(err) => Err(err.into()),
    }
}
