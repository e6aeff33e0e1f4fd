//! Error types for passboard-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from rendering a listing or rewriting a document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// The document has no element matching the listing marker.
    #[error("listing region {marker} not found in document")]
    RegionNotFound { marker: String },

    /// More than one element matches the listing marker.
    #[error("listing region {marker} is ambiguous: {count} matches")]
    AmbiguousRegion { marker: String, count: usize },

    /// The marker element opens but never closes.
    #[error("listing region {marker} opened at byte {offset} is never closed")]
    UnclosedRegion { marker: String, offset: usize },
}

impl RenderError {
    /// `true` for problems with the document's structure rather than with
    /// templates or I/O.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RenderError::RegionNotFound { .. }
                | RenderError::AmbiguousRegion { .. }
                | RenderError::UnclosedRegion { .. }
        )
    }
}
