use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the retry runtime.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sync error: {0}")]
    Sync(#[from] passboard_sync::SyncError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RunnerError {
    RunnerError::Io {
        path: path.into(),
        source,
    }
}
