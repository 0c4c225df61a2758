//! Reconciliation engine.
//!
//! For one kind at a time: read a fresh [`Snapshot`], create or update every
//! in-scope desired item, auto-creating missing ancestor folders, then report
//! server items of that kind that are neither touched nor desired as orphans.
//! Nothing is ever deleted.

use std::collections::BTreeSet;
use std::path::PathBuf;

use hottest_core::{CanonicalPath, ConfigError, FolderModel, RESERVED_AGENT};
use hottest_renderer::Renderer;

use crate::error::SyncError;
use crate::item::{DesiredItem, DesiredSet, ItemKind};
use crate::snapshot::Snapshot;
use crate::transport::{Artifact, CiServer, FOLDER_CLASS};

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    /// Desired, but filtered out by the whitelist.
    Skip,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Skip => "skip",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub kind: ItemKind,
    pub path: CanonicalPath,
    pub action: Action,
}

/// Outcome of a sync or revert run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub actions: Vec<ActionRecord>,
    pub created_folders: Vec<CanonicalPath>,
    pub orphans: Vec<(ItemKind, CanonicalPath)>,
    pub warnings: Vec<String>,
    pub backup: Option<PathBuf>,
}

impl Report {
    pub fn count(&self, action: Action) -> usize {
        self.actions.iter().filter(|a| a.action == action).count()
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct Reconciler<'a, S: CiServer + ?Sized> {
    server: &'a mut S,
    folder: Artifact,
    report: Report,
}

impl<'a, S: CiServer + ?Sized> Reconciler<'a, S> {
    pub fn new(server: &'a mut S, renderer: &Renderer) -> Result<Self, SyncError> {
        let folder = Artifact {
            document: renderer.render_folder(&FolderModel)?,
            metadata: FolderModel.to_string(),
        };
        Ok(Reconciler {
            server,
            folder,
            report: Report::default(),
        })
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    pub fn report_mut(&mut self) -> &mut Report {
        &mut self.report
    }

    /// Reconcile one desired set, dispatching on its kind.
    pub fn sync(&mut self, desired: &DesiredSet) -> Result<(), SyncError> {
        if desired.is_empty() {
            tracing::info!("sync definition contains no {}s", desired.kind);
        }
        match desired.kind {
            ItemKind::Node => self.sync_nodes(desired)?,
            ItemKind::Job | ItemKind::Pipeline => self.sync_jobs(desired)?,
        }
        for path in desired.skipped() {
            self.record(desired.kind, path, Action::Skip);
        }
        Ok(())
    }

    fn record(&mut self, kind: ItemKind, path: &CanonicalPath, action: Action) {
        self.report.actions.push(ActionRecord {
            kind,
            path: path.clone(),
            action,
        });
    }

    fn sync_nodes(&mut self, desired: &DesiredSet) -> Result<(), SyncError> {
        let snapshot = Snapshot::read(&*self.server)?;
        let mut seen = BTreeSet::new();

        for item in &desired.items {
            let name = item.path.as_str();
            if name == RESERVED_AGENT {
                return Err(ConfigError::ReservedName {
                    name: name.to_string(),
                }
                .into());
            }
            if snapshot.has_node(name) {
                tracing::info!("node \"{name}\": updating");
                seen.insert(name.to_string());
                self.server.set_node_config(name, &item.artifact)?;
                self.record(ItemKind::Node, &item.path, Action::Update);
            } else {
                tracing::info!("node \"{name}\": creating");
                self.server.create_node(name)?;
                self.server.set_node_config(name, &item.artifact)?;
                self.record(ItemKind::Node, &item.path, Action::Create);
            }
        }

        for node in &snapshot.nodes {
            let path = CanonicalPath::new(node);
            if !seen.contains(node) && !desired.full.contains(&path) {
                self.orphan(ItemKind::Node, path);
            }
        }
        Ok(())
    }

    fn sync_jobs(&mut self, desired: &DesiredSet) -> Result<(), SyncError> {
        let kind = desired.kind;
        let Some(class) = kind.class() else {
            return Ok(());
        };
        let snapshot = Snapshot::read(&*self.server)?;
        let mut folders: BTreeSet<CanonicalPath> =
            snapshot.paths_with_class(FOLDER_CLASS).cloned().collect();
        let mut seen = BTreeSet::new();

        for item in &desired.items {
            if kind == ItemKind::Pipeline {
                self.validate_pipeline(item, &snapshot)?;
            }
            check_class(&snapshot, &item.path, class)?;
            self.ensure_folders(kind, &item.path, &snapshot, &mut folders)?;

            if snapshot.class_of(&item.path) == Some(class) {
                tracing::info!("{kind} \"{}\": updating", item.path);
                seen.insert(item.path.clone());
                self.server.set_job_config(&item.path, &item.artifact)?;
                self.record(kind, &item.path, Action::Update);
            } else {
                tracing::info!("{kind} \"{}\": creating", item.path);
                self.server.create_job(&item.path, &item.artifact)?;
                self.record(kind, &item.path, Action::Create);
            }
        }

        let orphans: Vec<CanonicalPath> = snapshot
            .paths_with_class(class)
            .filter(|p| !seen.contains(*p) && !desired.full.contains(*p))
            .cloned()
            .collect();
        for path in orphans {
            self.orphan(kind, path);
        }
        Ok(())
    }

    fn orphan(&mut self, kind: ItemKind, path: CanonicalPath) {
        tracing::warn!("unreferenced {kind} \"{path}\" exists on server");
        self.report.orphans.push((kind, path));
    }

    /// Create every missing ancestor of `path`, root to leaf.
    fn ensure_folders(
        &mut self,
        kind: ItemKind,
        path: &CanonicalPath,
        snapshot: &Snapshot,
        folders: &mut BTreeSet<CanonicalPath>,
    ) -> Result<(), SyncError> {
        for ancestor in path.ancestors() {
            if folders.contains(&ancestor) {
                continue;
            }
            check_class(snapshot, &ancestor, FOLDER_CLASS)?;
            tracing::info!("{kind} \"{path}\": adding non-existent folder \"{ancestor}\"");
            self.server.create_job(&ancestor, &self.folder)?;
            self.report.created_folders.push(ancestor.clone());
            folders.insert(ancestor);
        }
        Ok(())
    }

    /// Warn about pipeline jobs missing on the server, or parameters they
    /// don't declare. Never fails on a finding.
    fn validate_pipeline(&mut self, item: &DesiredItem, snapshot: &Snapshot) -> Result<(), SyncError> {
        for job_ref in &item.job_refs {
            if snapshot.class_of(&job_ref.job) != ItemKind::Job.class() {
                self.report.warn(format!(
                    "pipeline \"{}\": job \"{}\" doesn't exist on the server",
                    item.path, job_ref.job
                ));
                continue;
            }
            if job_ref.params.is_empty() {
                continue;
            }
            let declared = self.server.job_parameters(&job_ref.job)?;
            for param in job_ref.params.keys() {
                if !declared.iter().any(|d| d == param) {
                    self.report.warn(format!(
                        "pipeline \"{}\": job \"{}\" has no parameter \"{param}\"",
                        item.path, job_ref.job
                    ));
                }
            }
        }
        Ok(())
    }
}

fn check_class(snapshot: &Snapshot, path: &CanonicalPath, wanted: &str) -> Result<(), SyncError> {
    match snapshot.class_of(path) {
        Some(existing) if existing != wanted => Err(SyncError::Conflict {
            path: path.to_string(),
            existing: existing.to_string(),
            wanted: wanted.to_string(),
        }),
        _ => Ok(()),
    }
}
