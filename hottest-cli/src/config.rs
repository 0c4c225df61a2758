//! Optional user profile at `~/.hottest/config.yaml`.
//!
//! ```yaml
//! url: https://jenkins.example.com
//! user: ci-bot
//! token: 0123abcd
//! include: [/srv/hottest/lab]
//! root-folder: test
//! backup-dir: /var/backups/hottest
//! ```
//!
//! Every key is optional; command-line values win.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

pub const DEFAULT_ROOT_FOLDER: &str = "test";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Profile {
    pub url: Option<String>,
    pub user: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub include: Vec<PathBuf>,
    pub root_folder: Option<String>,
    pub backup_dir: Option<PathBuf>,
}

pub fn profile_path_at(home: &Path) -> PathBuf {
    home.join(".hottest").join("config.yaml")
}

/// Load the profile under `home`; a missing file is an empty profile.
pub fn load_profile_at(home: &Path) -> Result<Profile> {
    let path = profile_path_at(home);
    if !path.exists() {
        return Ok(Profile::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

/// `load_profile_at` for the current user; no home directory means no profile.
pub fn load_profile() -> Result<Profile> {
    match dirs::home_dir() {
        Some(home) => load_profile_at(&home),
        None => Ok(Profile::default()),
    }
}

/// Server connection flags shared by `sync` and `revert`.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Jenkins base URL.
    #[arg(long, env = "HOTTEST_JENKINS_URL")]
    pub url: Option<String>,

    /// Jenkins user.
    #[arg(long, env = "HOTTEST_JENKINS_USER")]
    pub user: Option<String>,

    /// Jenkins password or API token.
    #[arg(long, env = "HOTTEST_JENKINS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

/// Fully resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub url: String,
    pub user: Option<String>,
    pub token: Option<String>,
}

impl ServerArgs {
    pub fn resolve(&self, profile: &Profile) -> Result<Connection> {
        let url = self
            .url
            .clone()
            .or_else(|| profile.url.clone())
            .context("no Jenkins URL: pass --url, set HOTTEST_JENKINS_URL or add `url` to ~/.hottest/config.yaml")?;
        Ok(Connection {
            url,
            user: self.user.clone().or_else(|| profile.user.clone()),
            token: self.token.clone().or_else(|| profile.token.clone()),
        })
    }
}
