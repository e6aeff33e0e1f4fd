//! Error types for passboard-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, with the path that was being accessed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not a JSON list of records.
    #[error("failed to parse record store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (save path).
    #[error("record store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The dataset breaks the unique, non-empty name invariant.
    #[error("invalid dataset at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// A staged or committed atomic write failed at `path`.
#[derive(Debug, Error)]
#[error("I/O error at {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl WriteError {
    pub(crate) fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WriteError {
            path: path.into(),
            source,
        }
    }
}

impl From<WriteError> for StoreError {
    fn from(err: WriteError) -> Self {
        StoreError::Io {
            path: err.path,
            source: err.source,
        }
    }
}

/// Errors raised while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, including serde_yaml's line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML serialization error (writing the default config).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value parsed but is outside its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn config_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
