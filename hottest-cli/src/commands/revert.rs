//! `hottest revert`: push a backup taken by `sync` back to the server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use hottest_sync::backup;

use crate::commands::print_report;
use crate::config::{self, ServerArgs};
use crate::jenkins::Jenkins;

#[derive(Args, Debug)]
pub struct RevertArgs {
    #[command(flatten)]
    pub server: ServerArgs,

    /// Backup directory, as printed by `sync`.
    #[arg(short = 'b', long)]
    pub backup_path: PathBuf,
}

impl RevertArgs {
    pub fn run(self) -> Result<()> {
        let profile = config::load_profile()?;
        let conn = self.server.resolve(&profile)?;
        let mut server = Jenkins::connect(&conn).context("failed to set up the Jenkins client")?;

        let report = backup::revert(&mut server, &self.backup_path)
            .with_context(|| format!("revert from {} failed", self.backup_path.display()))?;
        print_report(&report, false);
        Ok(())
    }
}
