//! Error types for passboard-sync.

use std::path::PathBuf;

use thiserror::Error;

use passboard_core::error::StoreError;
use passboard_renderer::RenderError;

/// All errors that can arise from publishing, drift checks and diffs.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An error from the record store.
    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `extract_command` is not configured.
    #[error("no extract_command configured; set it in passboard.yaml")]
    MissingExtractCommand,
}

impl SyncError {
    /// Publish phase this error belongs to, for log lines.
    pub fn phase(&self) -> &'static str {
        match self {
            SyncError::Render(_) => "render",
            SyncError::Store(_) => "store",
            SyncError::Io { .. } => "document",
            SyncError::MissingExtractCommand => "setup",
        }
    }
}

/// Failure of the extraction step. Always counted as a failed cycle.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    /// The snapshot slot could not be written or parsed.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] StoreError),

    #[error("extractor panicked: {0}")]
    Panicked(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
