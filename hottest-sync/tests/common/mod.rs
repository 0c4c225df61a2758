//! In-memory CI server and an include-root fixture shared by the sync tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hottest_core::{CanonicalPath, SearchDirs};
use hottest_sync::transport::{FOLDER_CLASS, JOB_CLASS};
use hottest_sync::{Artifact, CiServer, RemoteJob, SyncMode, SyncOptions, TransportError};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// FakeServer
// ---------------------------------------------------------------------------

/// Items by path with `(class, config)`, nodes with their config, and a log
/// of every write call.
#[derive(Debug, Default)]
pub struct FakeServer {
    pub items: BTreeMap<CanonicalPath, (String, String)>,
    pub nodes: BTreeMap<String, String>,
    pub params: BTreeMap<CanonicalPath, Vec<String>>,
    pub calls: Vec<String>,
}

impl FakeServer {
    pub fn with_job(mut self, path: &str, class: &str, config: &str) -> Self {
        self.items
            .insert(path.into(), (class.to_string(), config.to_string()));
        self
    }

    pub fn with_folder(self, path: &str) -> Self {
        self.with_job(path, FOLDER_CLASS, "<folder/>")
    }

    pub fn with_node(mut self, name: &str, config: &str) -> Self {
        self.nodes.insert(name.to_string(), config.to_string());
        self
    }

    pub fn with_params(mut self, path: &str, params: &[&str]) -> Self {
        self.params
            .insert(path.into(), params.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn config(&self, path: &str) -> Option<&str> {
        self.items
            .get(&CanonicalPath::new(path))
            .map(|(_, c)| c.as_str())
    }

    pub fn class(&self, path: &str) -> Option<&str> {
        self.items
            .get(&CanonicalPath::new(path))
            .map(|(c, _)| c.as_str())
    }

    fn children(&self, parent: Option<&CanonicalPath>) -> Vec<RemoteJob> {
        self.items
            .iter()
            .filter(|(path, _)| path.parent().as_ref() == parent)
            .map(|(path, (class, _))| {
                let mut job = RemoteJob::new(path.leaf(), class);
                if class == FOLDER_CLASS {
                    job.children = self.children(Some(path));
                }
                job
            })
            .collect()
    }

    fn missing(what: impl std::fmt::Display) -> TransportError {
        TransportError::NotFound {
            what: what.to_string(),
        }
    }
}

impl CiServer for FakeServer {
    fn list_jobs(&self) -> Result<Vec<RemoteJob>, TransportError> {
        Ok(self.children(None))
    }

    fn list_nodes(&self) -> Result<Vec<String>, TransportError> {
        let mut nodes = vec!["master".to_string()];
        nodes.extend(self.nodes.keys().cloned());
        Ok(nodes)
    }

    fn get_job_config(&self, path: &CanonicalPath) -> Result<String, TransportError> {
        self.items
            .get(path)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| Self::missing(path))
    }

    fn set_job_config(&mut self, path: &CanonicalPath, artifact: &Artifact) -> Result<(), TransportError> {
        self.calls.push(format!("set_job_config {path}"));
        let slot = self.items.get_mut(path).ok_or_else(|| Self::missing(path))?;
        slot.1 = artifact.document.clone();
        Ok(())
    }

    fn create_job(&mut self, path: &CanonicalPath, artifact: &Artifact) -> Result<(), TransportError> {
        self.calls.push(format!("create_job {path}"));
        if let Some(parent) = path.parent() {
            if self.items.get(&parent).map(|(c, _)| c.as_str()) != Some(FOLDER_CLASS) {
                return Err(Self::missing(format!("folder {parent}")));
            }
        }
        let class = if artifact.document.contains("<com.cloudbees.hudson.plugins.folder.Folder") {
            FOLDER_CLASS
        } else if artifact.document.contains("<flow-definition") {
            hottest_sync::transport::PIPELINE_CLASS
        } else {
            JOB_CLASS
        };
        self.items
            .insert(path.clone(), (class.to_string(), artifact.document.clone()));
        Ok(())
    }

    fn get_node_config(&self, name: &str) -> Result<String, TransportError> {
        self.nodes
            .get(name)
            .cloned()
            .ok_or_else(|| Self::missing(format!("node {name}")))
    }

    fn set_node_config(&mut self, name: &str, artifact: &Artifact) -> Result<(), TransportError> {
        self.calls.push(format!("set_node_config {name}"));
        let slot = self
            .nodes
            .get_mut(name)
            .ok_or_else(|| Self::missing(format!("node {name}")))?;
        *slot = artifact.document.clone();
        Ok(())
    }

    fn create_node(&mut self, name: &str) -> Result<(), TransportError> {
        self.calls.push(format!("create_node {name}"));
        self.nodes.insert(name.to_string(), "<slave/>".to_string());
        Ok(())
    }

    fn job_parameters(&self, path: &CanonicalPath) -> Result<Vec<String>, TransportError> {
        Ok(self.params.get(path).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Include root
// ---------------------------------------------------------------------------

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// An include root with one board, one test, a pipeline and a sync file
/// defining node `evk-1`, tests `a` and `b` and pipeline `nightly`.
pub fn include_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "chunks/runtime/header.json", "{}");
    write(root, "chunks/runtime/header.sh", "set -e\n");
    write(root, "chunks/runtime/footer.json", "{}");
    write(root, "chunks/runtime/footer.sh", "echo done\n");
    write(
        root,
        "chunks/boards/evk.json",
        r#"{ "description": "evk board", "environment-variables": { "SERIAL": "/dev/ttyUSB0" } }"#,
    );
    write(root, "chunks/boards/evk.sh", "echo board\n");
    write(
        root,
        "chunks/tests/boot.json",
        r#"{ "description": "boot", "parameters": { "TIMEOUT": { "default": "30" } } }"#,
    );
    write(root, "chunks/tests/boot.sh", "boot\n");
    write(
        root,
        "parametrization/slow.json",
        r#"{ "parameter-default-overrides": { "TIMEOUT": "300" } }"#,
    );
    write(
        root,
        "pipelines/nightly.json",
        r#"{
            "jenkins-cron-expression": "H 2 * * *",
            "parametrized-tests": { "a": { "TIMEOUT": "5" } },
            "main-execution-sequence": ["a", "b"]
        }"#,
    );
    write(
        root,
        "sync.json",
        r#"{
            "nodes": { "evk-1": { "board-chunk": "boards/evk" } },
            "tests": {
                "a": { "board-chunk": "boards/evk", "test-chunk": "tests/boot" },
                "b": {
                    "board-chunk": "boards/evk",
                    "test-chunk": "tests/boot",
                    "parametrization-files": ["slow.json"]
                }
            },
            "pipelines": { "nightly": { "file": "nightly.json" } }
        }"#,
    );
    dir
}

/// Options for a run over [`include_root`] under root folder `team`, with
/// backups disabled.
pub fn options(root: &Path) -> SyncOptions {
    let mut dirs = SearchDirs::default();
    dirs.add_include_root(root).unwrap();
    SyncOptions {
        sync_file: root.join("sync.json"),
        dirs,
        root_folder: "team".to_string(),
        mode: SyncMode {
            backup: false,
            ..SyncMode::default()
        },
        whitelist: Vec::new(),
        backup_dir: root.join("backups"),
        dry_run: false,
    }
}

pub fn only(nodes: bool, tests: bool, pipelines: bool) -> SyncMode {
    SyncMode {
        backup: false,
        nodes,
        tests,
        pipelines,
    }
}

pub fn backup_root(dir: &TempDir) -> PathBuf {
    dir.path().join("backups")
}
