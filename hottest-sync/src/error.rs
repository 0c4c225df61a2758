//! Error types for hottest-sync.

use std::path::PathBuf;

use thiserror::Error;

use hottest_core::{BuildError, ConfigError, LookupError};
use hottest_renderer::RenderError;

use crate::transport::TransportError;

/// All errors that can arise from sync and revert runs.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("server error: {0}")]
    Transport(#[from] TransportError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("on whitelist filter with regex \"{pattern}\": {source}")]
    Whitelist {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The path is taken on the server by an item of another type.
    #[error("\"{path}\" exists on the server as {existing}, refusing to use it as {wanted}")]
    Conflict {
        path: String,
        existing: String,
        wanted: String,
    },

    #[error("invalid sync mode \"{mode}\": unknown item '{found}' (expected any of b, n, t, p)")]
    Mode { mode: String, found: char },

    #[error("no chunk include dir was passed")]
    NoChunkDirs,
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
