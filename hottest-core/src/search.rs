//! Ordered search directories for chunks, parametrization and pipeline files.

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, LookupError};

/// The three search lists used by `gen` and `sync`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchDirs {
    pub chunks: Vec<PathBuf>,
    pub parametrization: Vec<PathBuf>,
    pub pipelines: Vec<PathBuf>,
}

impl SearchDirs {
    /// Add a structured include root: `root/chunks`, `root/parametrization`
    /// and `root/pipelines` are appended to their lists.
    pub fn add_include_root(&mut self, root: &Path) -> Result<(), ConfigError> {
        if !root.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        self.chunks.push(root.join("chunks"));
        self.parametrization.push(root.join("parametrization"));
        self.pipelines.push(root.join("pipelines"));
        Ok(())
    }

    /// Locate the parametrization file `suffix` on behalf of `item`.
    pub fn find_parametrization(&self, item: &str, suffix: &str) -> Result<PathBuf, LookupError> {
        find_suffix(&self.parametrization, suffix).ok_or_else(|| LookupError::Parametrization {
            item: item.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// Locate the pipeline definition `suffix` on behalf of `item`.
    pub fn find_pipeline(&self, item: &str, suffix: &str) -> Result<PathBuf, LookupError> {
        find_suffix(&self.pipelines, suffix).ok_or_else(|| LookupError::Pipeline {
            item: item.to_string(),
            suffix: suffix.to_string(),
        })
    }
}

/// First `<dir>/<suffix>` that exists.
pub fn find_suffix(dirs: &[PathBuf], suffix: &str) -> Option<PathBuf> {
    dirs.iter().map(|d| d.join(suffix)).find(|p| p.exists())
}
