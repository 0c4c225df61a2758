//! `hottest sync`: reconcile a Jenkins server with a sync definition.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hottest_core::SearchDirs;
use hottest_sync::{run_sync, DryRunServer, DumpMode, SyncMode, SyncOptions};

use crate::commands::print_report;
use crate::config::{self, ServerArgs, DEFAULT_ROOT_FOLDER};
use crate::jenkins::Jenkins;

/// Backup root used when neither a flag nor the profile names one.
pub const DEFAULT_BACKUP_DIR: &str = "hottest.bak";

/// Arguments for `hottest sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Sync definition file.
    #[arg(short = 'f', long)]
    pub sync_file: PathBuf,

    /// Adds a chunk include directory. Repeatable.
    #[arg(short = 'c', long = "chunk-include")]
    pub chunk_include: Vec<PathBuf>,

    /// Adds a parametrization include directory. Repeatable.
    #[arg(short = 'p', long = "parametrization-include")]
    pub parametrization_include: Vec<PathBuf>,

    /// Adds a pipeline include directory. Repeatable.
    #[arg(short = 't', long = "pipeline-include")]
    pub pipeline_include: Vec<PathBuf>,

    /// Adds a structured include dir holding `chunks/`, `parametrization/`
    /// and `pipelines/`. Repeatable.
    #[arg(short = 'I', long)]
    pub include: Vec<PathBuf>,

    /// Enabled phases: b(ackup), n(odes), t(ests), p(ipelines).
    #[arg(short = 'm', long, default_value = "btnp")]
    pub mode: String,

    /// Only sync items matching one of these regexes. Repeatable.
    #[arg(short = 'w', long = "item-whitelist")]
    pub item_whitelist: Vec<String>,

    /// Folder jobs and pipelines are placed under ("/" for the server root).
    #[arg(short = 'r', long)]
    pub root_folder: Option<String>,

    /// Where backups are written [default: hottest.bak].
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Log what would change without touching the server.
    #[arg(long)]
    pub dry_run: bool,

    /// Like --dry-run, also dumping every generated document.
    #[arg(long, conflicts_with_all = ["dry_run", "dry_run_metadata", "dry_run_diff"])]
    pub dry_run_xml: bool,

    /// Like --dry-run, also dumping every model's metadata.
    #[arg(long, conflicts_with_all = ["dry_run", "dry_run_diff"])]
    pub dry_run_metadata: bool,

    /// Like --dry-run, also printing a diff against the live documents.
    #[arg(long, conflicts_with = "dry_run")]
    pub dry_run_diff: bool,
}

impl SyncArgs {
    fn dump_mode(&self) -> Option<DumpMode> {
        if self.dry_run_xml {
            Some(DumpMode::Document)
        } else if self.dry_run_metadata {
            Some(DumpMode::Metadata)
        } else if self.dry_run_diff {
            Some(DumpMode::Diff)
        } else if self.dry_run {
            Some(DumpMode::None)
        } else {
            None
        }
    }

    /// Resolve flags and profile into library options.
    pub fn options(&self, profile: &config::Profile) -> Result<SyncOptions> {
        let mut dirs = SearchDirs {
            chunks: self.chunk_include.clone(),
            parametrization: self.parametrization_include.clone(),
            pipelines: self.pipeline_include.clone(),
        };
        for root in self.include.iter().chain(profile.include.iter()) {
            dirs.add_include_root(root)
                .with_context(|| format!("bad include dir {}", root.display()))?;
        }
        let mode: SyncMode = self.mode.parse()?;

        Ok(SyncOptions {
            sync_file: self.sync_file.clone(),
            dirs,
            root_folder: self
                .root_folder
                .clone()
                .or_else(|| profile.root_folder.clone())
                .unwrap_or_else(|| DEFAULT_ROOT_FOLDER.to_string()),
            mode,
            whitelist: self.item_whitelist.clone(),
            backup_dir: self
                .backup_dir
                .clone()
                .or_else(|| profile.backup_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_DIR)),
            dry_run: self.dump_mode().is_some(),
        })
    }

    pub fn run(self) -> Result<()> {
        let profile = config::load_profile()?;
        let opts = self.options(&profile)?;
        let conn = self.server.resolve(&profile)?;
        let server = Jenkins::connect(&conn).context("failed to set up the Jenkins client")?;

        let report = match self.dump_mode() {
            None => {
                let mut server = server;
                run_sync(&mut server, &opts)
            }
            Some(dump) => {
                let stdout = std::io::stdout();
                let mut dry = DryRunServer::new(server, stdout.lock(), dump);
                run_sync(&mut dry, &opts)
            }
        }
        .with_context(|| format!("sync of {} failed", self.sync_file.display()))?;

        print_report(&report, opts.dry_run);
        Ok(())
    }
}
