//! Error types for hottest-renderer.

use hottest_core::ConfigError;
use thiserror::Error;

/// All errors that can arise while producing an artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Formatting the generated script failed.
    #[error("script formatting failed: {0}")]
    Format(#[from] std::fmt::Error),

    /// The model cannot be expressed in the target format.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
