//! Server backups and reverting from them.
//!
//! A backup lives in `<root>/<sync file name>-<timestamp>/` with one
//! `<canonical path>.xml` file per item under `nodes/`, `jobs/` and
//! `pipelines/`, mirroring the server's folder structure.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use hottest_core::CanonicalPath;
use hottest_renderer::Renderer;

use crate::engine::{Reconciler, Report};
use crate::error::{io_err, SyncError};
use crate::item::{DesiredItem, DesiredSet, ItemKind};
use crate::snapshot::Snapshot;
use crate::transport::{Artifact, CiServer};
use crate::whitelist::Whitelist;

const TIMESTAMP: &str = "%Y-%m-%d_%H-%M-%S";

/// `<sync file name>-<timestamp>`
pub fn backup_name(sync_file: &Path, now: DateTime<Local>) -> String {
    let base = sync_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{base}-{}", now.format(TIMESTAMP))
}

/// Write `content` to `path` through a sibling `.tmp` file and a rename.
pub(crate) fn atomic_write(path: &Path, content: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.hottest.tmp", path.display()));
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn item_file(dir: &Path, kind: ItemKind, path: &CanonicalPath) -> PathBuf {
    dir.join(kind.backup_dir())
        .join(format!("{}.xml", path.as_str()))
}

/// Export every whitelisted live node, job and pipeline into a new backup
/// directory under `root`. Returns the directory.
pub fn create_backup<S: CiServer + ?Sized>(
    server: &S,
    root: &Path,
    sync_file: &Path,
    whitelist: &Whitelist,
) -> Result<PathBuf, SyncError> {
    let dir = root.join(backup_name(sync_file, Local::now()));
    for kind in ItemKind::all() {
        let sub = dir.join(kind.backup_dir());
        std::fs::create_dir_all(&sub).map_err(|e| io_err(&sub, e))?;
    }
    tracing::info!("backing up server state to folder: \"{}\"", dir.display());

    let snapshot = Snapshot::read(server)?;
    for kind in [ItemKind::Job, ItemKind::Pipeline] {
        let Some(class) = kind.class() else { continue };
        for path in snapshot.paths_with_class(class) {
            if !whitelist.matches(path.as_str()) {
                continue;
            }
            let document = server.get_job_config(path)?;
            atomic_write(&item_file(&dir, kind, path), &document)?;
        }
    }
    for node in &snapshot.nodes {
        if !whitelist.matches(node) {
            continue;
        }
        let document = server.get_node_config(node)?;
        atomic_write(&item_file(&dir, ItemKind::Node, &CanonicalPath::new(node)), &document)?;
    }

    tracing::info!("backup done");
    Ok(dir)
}

fn collect_xml_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_xml_files(&path, out)?;
        } else if meta.is_file() && path.extension().and_then(|s| s.to_str()) == Some("xml") {
            out.push(path);
        }
    }
    Ok(())
}

/// Read one kind of a backup back as a desired set; stored documents are
/// used verbatim.
pub fn load_kind(dir: &Path, kind: ItemKind) -> Result<DesiredSet, SyncError> {
    let base = dir.join(kind.backup_dir());
    let mut set = DesiredSet::new(kind);
    if !base.is_dir() {
        return Ok(set);
    }

    let mut files = Vec::new();
    collect_xml_files(&base, &mut files)?;
    files.sort();

    for file in files {
        let rel = file.strip_prefix(&base).unwrap_or(file.as_path());
        let name = rel.with_extension("").to_string_lossy().replace('\\', "/");
        let path = CanonicalPath::new(&name);
        let document = std::fs::read_to_string(&file).map_err(|e| io_err(&file, e))?;
        set.full.insert(path.clone());
        set.items.push(DesiredItem {
            path,
            artifact: Artifact {
                document,
                metadata: format!("[backup     ] {}\n", file.display()),
            },
            job_refs: Vec::new(),
        });
    }
    Ok(set)
}

/// Push a backup back to the server: nodes, then jobs, then pipelines, with
/// no whitelist.
pub fn revert<S: CiServer + ?Sized>(server: &mut S, dir: &Path) -> Result<Report, SyncError> {
    let sets = ItemKind::all()
        .iter()
        .map(|kind| load_kind(dir, *kind))
        .collect::<Result<Vec<_>, _>>()?;

    if sets.iter().all(DesiredSet::is_empty) {
        let mut report = Report::default();
        let message = format!(
            "no .xml files found under the \"nodes\", \"jobs\" or \"pipelines\" subdirectories of \"{}\"",
            dir.display()
        );
        tracing::warn!("{message}");
        report.warnings.push(message);
        return Ok(report);
    }

    let renderer = Renderer::new()?;
    let mut reconciler = Reconciler::new(server, &renderer)?;
    for set in &sets {
        reconciler.sync(set)?;
    }
    Ok(reconciler.into_report())
}
