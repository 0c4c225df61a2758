//! # hottest-sync
//!
//! Reconciles a CI server with a sync definition.
//!
//! Call [`run_sync`] to build every desired item and create or update it on
//! the server, or [`backup::revert`] to push a previous backup back.

pub mod backup;
pub mod definition;
pub mod dry_run;
pub mod engine;
pub mod error;
pub mod item;
pub mod snapshot;
pub mod transport;
pub mod whitelist;

use std::path::PathBuf;

use hottest_core::{CanonicalPath, SearchDirs};
use hottest_renderer::Renderer;

pub use definition::{Planner, SyncDefinition};
pub use dry_run::{DryRunServer, DumpMode};
pub use engine::{Action, ActionRecord, Reconciler, Report};
pub use error::SyncError;
pub use item::{DesiredItem, DesiredSet, ItemKind};
pub use transport::{Artifact, CiServer, RemoteJob, TransportError};
pub use whitelist::{SyncMode, Whitelist};

/// Everything a sync run needs besides the server.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub sync_file: PathBuf,
    pub dirs: SearchDirs,
    pub root_folder: String,
    pub mode: SyncMode,
    pub whitelist: Vec<String>,
    pub backup_dir: PathBuf,
    /// Dry runs never back up.
    pub dry_run: bool,
}

/// Build the desired state of every selected kind, optionally back up the
/// server, then reconcile nodes, jobs and pipelines in that order.
///
/// All models are built before the server is touched, so a broken definition
/// fails the run without partial changes.
pub fn run_sync<S: CiServer + ?Sized>(server: &mut S, opts: &SyncOptions) -> Result<Report, SyncError> {
    if opts.dirs.chunks.is_empty() {
        return Err(SyncError::NoChunkDirs);
    }
    let whitelist = Whitelist::new(&opts.whitelist)?;
    let def = SyncDefinition::load(&opts.sync_file)?;
    let renderer = Renderer::new()?;
    let planner = Planner {
        dirs: &opts.dirs,
        root_folder: CanonicalPath::new(&opts.root_folder),
        whitelist: &whitelist,
        renderer: &renderer,
    };

    let mut sets = Vec::new();
    if opts.mode.nodes {
        sets.push(planner.nodes(&def)?);
    }
    if opts.mode.tests {
        sets.push(planner.jobs(&def)?);
    }
    if opts.mode.pipelines {
        sets.push(planner.pipelines(&def)?);
    }

    let backup = if opts.mode.backup && !opts.dry_run {
        Some(backup::create_backup(
            &*server,
            &opts.backup_dir,
            &opts.sync_file,
            &whitelist,
        )?)
    } else {
        None
    };

    let mut reconciler = Reconciler::new(server, &renderer)?;
    reconciler.report_mut().backup = backup;
    for set in &sets {
        reconciler.sync(set)?;
    }
    Ok(reconciler.into_report())
}
