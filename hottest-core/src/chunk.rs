//! Chunk resolution and chunk metadata.
//!
//! A chunk is a `<prefix>.json` / `<prefix>.sh` pair found under one of an
//! ordered list of search directories.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::LookupError;
use crate::types::TextLines;

/// Return the first `<dir>/<logical>` prefix for which both the `.json` and
/// the `.sh` file exist. A directory holding only one of the two is skipped.
pub fn resolve(search_dirs: &[PathBuf], logical: &str) -> Option<PathBuf> {
    search_dirs.iter().find_map(|dir| {
        let prefix = dir.join(logical);
        if metadata_path(&prefix).is_file() && script_path(&prefix).is_file() {
            tracing::debug!("chunk {logical} resolved to {}", prefix.display());
            Some(prefix)
        } else {
            None
        }
    })
}

/// [`resolve`], turning a miss into [`LookupError::Chunk`].
pub fn require(search_dirs: &[PathBuf], logical: &str) -> Result<PathBuf, LookupError> {
    resolve(search_dirs, logical).ok_or_else(|| LookupError::Chunk {
        chunk: logical.to_string(),
        searched: search_dirs.len(),
    })
}

/// `<prefix>.json`
pub fn metadata_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, "json")
}

/// `<prefix>.sh`
pub fn script_path(prefix: &Path) -> PathBuf {
    with_suffix(prefix, "sh")
}

fn with_suffix(prefix: &Path, ext: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

/// Base name of a logical chunk path with any extension removed
/// (`boards/imx8/evk` → `evk`).
pub fn base_name(logical: &str) -> &str {
    let file = logical.rsplit('/').next().unwrap_or(logical);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    }
}

/// One declared job parameter as written in chunk metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParameterSpec {
    #[serde(default)]
    pub description: Option<TextLines>,
    #[serde(default)]
    pub default: Option<TextLines>,
}

/// Metadata half of a chunk. Agent and job chunks share the shape; their
/// schemas decide which fields may appear.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChunkMeta {
    #[serde(default)]
    pub description: Option<TextLines>,
    #[serde(default)]
    pub fs_path: Option<String>,
    #[serde(default)]
    pub node_labels: Vec<String>,
    #[serde(default)]
    pub test_labels: Vec<String>,
    #[serde(default)]
    pub environment_variables: IndexMap<String, TextLines>,
    #[serde(default)]
    pub parameters: IndexMap<String, ParameterSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn partial_match_does_not_block_later_dir() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        touch(&a.path().join("boards/x.json"));
        touch(&b.path().join("boards/x.json"));
        touch(&b.path().join("boards/x.sh"));

        let dirs = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        assert_eq!(resolve(&dirs, "boards/x"), Some(b.path().join("boards/x")));
    }

    #[test]
    fn first_full_match_wins() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        for dir in [&a, &b] {
            touch(&dir.path().join("t.json"));
            touch(&dir.path().join("t.sh"));
        }
        let dirs = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        assert_eq!(resolve(&dirs, "t"), Some(a.path().join("t")));
    }

    #[test]
    fn miss_is_a_lookup_error() {
        let a = TempDir::new().unwrap();
        let err = require(&[a.path().to_path_buf()], "nothing").unwrap_err();
        assert!(matches!(err, LookupError::Chunk { ref chunk, searched: 1 } if chunk == "nothing"));
    }

    #[test]
    fn base_name_strips_dirs_and_extension() {
        assert_eq!(base_name("boards/imx8/evk"), "evk");
        assert_eq!(base_name("evk.v2"), "evk");
        assert_eq!(base_name("plain"), "plain");
    }

    #[test]
    fn suffix_is_appended_not_replaced() {
        let p = Path::new("/c/boards/evk.v2");
        assert_eq!(metadata_path(p), PathBuf::from("/c/boards/evk.v2.json"));
        assert_eq!(script_path(p), PathBuf::from("/c/boards/evk.v2.sh"));
    }
}
