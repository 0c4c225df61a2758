//! Agent (board) model and its builder.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::chunk::{self, ChunkMeta};
use crate::error::{BuildError, ConfigError};
use crate::loader;
use crate::schema::Schema;
use crate::types::TextLines;

/// Name the CI server keeps for its built-in executor.
pub const RESERVED_AGENT: &str = "master";

/// A build/test agent, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentModel {
    pub name: String,
    pub description: String,
    /// Working directory on the agent; `None` falls back to `./<name>`.
    pub fs_path: Option<String>,
    pub labels: IndexSet<String>,
    pub env_vars: IndexMap<String, String>,
}

/// Parametrization overlay for an agent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AgentOverlay {
    #[serde(default)]
    pub extra_node_labels: Vec<String>,
    #[serde(default)]
    pub environment_variable_overrides: IndexMap<String, TextLines>,
}

impl AgentOverlay {
    /// Load and validate an overlay file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        loader::load_as(path, Some(Schema::AgentOverlay))
    }
}

impl AgentModel {
    /// Working directory as it will be configured on the server.
    pub fn remote_fs(&self) -> String {
        match self.fs_path.as_deref() {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => format!("./{}", self.name),
        }
    }

    /// Layer an overlay on top of the model.
    ///
    /// Labels are added freely; env-var overrides may only touch variables
    /// the agent already defines. `origin` names the overlay in errors.
    pub fn apply_overlay(&mut self, overlay: &AgentOverlay, origin: &str) -> Result<(), ConfigError> {
        for label in &overlay.extra_node_labels {
            self.labels.insert(label.clone());
        }
        for (name, value) in &overlay.environment_variable_overrides {
            let Some(slot) = self.env_vars.get_mut(name) else {
                return Err(ConfigError::UnknownOverride {
                    origin: origin.to_string(),
                    what: "environment variable",
                    name: name.clone(),
                });
            };
            *slot = value.joined();
        }
        Ok(())
    }
}

/// Build an agent from its chunk, then apply each overlay file in order.
pub fn build(
    name: &str,
    search_dirs: &[PathBuf],
    agent_chunk: &str,
    overlay_files: &[PathBuf],
) -> Result<AgentModel, BuildError> {
    if name == RESERVED_AGENT {
        return Err(ConfigError::ReservedName {
            name: name.to_string(),
        }
        .into());
    }

    let mut model = from_chunk(name, search_dirs, agent_chunk)?;
    for file in overlay_files {
        let overlay = AgentOverlay::load(file)?;
        model.apply_overlay(&overlay, &file.display().to_string())?;
    }
    Ok(model)
}

/// Base model straight from the chunk metadata, no overlays.
pub(crate) fn from_chunk(
    name: &str,
    search_dirs: &[PathBuf],
    agent_chunk: &str,
) -> Result<AgentModel, BuildError> {
    let prefix = chunk::require(search_dirs, agent_chunk)?;
    let meta: ChunkMeta = loader::load_as(&chunk::metadata_path(&prefix), Some(Schema::AgentChunk))?;

    let mut labels = IndexSet::new();
    labels.insert(name.to_string());
    labels.insert(chunk::base_name(agent_chunk).to_string());
    for label in &meta.node_labels {
        labels.insert(label.trim().to_string());
    }

    let env_vars = meta
        .environment_variables
        .iter()
        .map(|(k, v)| (k.clone(), v.joined().trim().to_string()))
        .collect();

    Ok(AgentModel {
        name: name.to_string(),
        description: meta.description.map(|t| t.joined()).unwrap_or_default(),
        fs_path: meta.fs_path,
        labels,
        env_vars,
    })
}

impl fmt::Display for AgentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[name       ] {}", self.name)?;
        writeln!(f, "[description] {}", self.description)?;
        writeln!(f, "[fspath     ] {}", self.remote_fs())?;
        writeln!(f, "[labels     ] {}", self.labels.len())?;
        for label in &self.labels {
            writeln!(f, "[label      ] {label}")?;
        }
        writeln!(f, "[envvars    ] {}", self.env_vars.len())?;
        for (name, value) in &self.env_vars {
            writeln!(f, "[envvar     ] [{name}] {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> AgentModel {
        let mut env_vars = IndexMap::new();
        env_vars.insert("FOO".to_string(), "1".to_string());
        AgentModel {
            name: "evk-1".into(),
            description: String::new(),
            fs_path: None,
            labels: IndexSet::from(["evk-1".to_string()]),
            env_vars,
        }
    }

    #[test]
    fn override_of_known_key_changes_only_that_key() {
        let mut m = model();
        m.env_vars.insert("BAR".into(), "x".into());
        let overlay: AgentOverlay = serde_json::from_str(
            r#"{ "environment-variable-overrides": { "FOO": "2" } }"#,
        )
        .unwrap();
        m.apply_overlay(&overlay, "inline").unwrap();
        assert_eq!(m.env_vars["FOO"], "2");
        assert_eq!(m.env_vars["BAR"], "x");
    }

    #[test]
    fn override_of_unknown_key_fails() {
        let mut m = model();
        let overlay: AgentOverlay = serde_json::from_str(
            r#"{ "environment-variable-overrides": { "BAR": "9" } }"#,
        )
        .unwrap();
        let err = m.apply_overlay(&overlay, "p/board.json").unwrap_err();
        assert!(err.to_string().contains("p/board.json"));
        assert!(err.to_string().contains("BAR"));
    }

    #[test]
    fn overlays_add_labels_freely() {
        let mut m = model();
        let overlay: AgentOverlay =
            serde_json::from_str(r#"{ "extra-node-labels": ["lab-2", "evk-1"] }"#).unwrap();
        m.apply_overlay(&overlay, "inline").unwrap();
        let labels: Vec<&String> = m.labels.iter().collect();
        assert_eq!(labels, vec!["evk-1", "lab-2"]);
    }

    #[test]
    fn remote_fs_defaults_to_name() {
        let mut m = model();
        assert_eq!(m.remote_fs(), "./evk-1");
        m.fs_path = Some("/srv/agents/evk".into());
        assert_eq!(m.remote_fs(), "/srv/agents/evk");
    }

    #[test]
    fn metadata_lists_counts_then_entries() {
        let text = model().to_string();
        assert!(text.contains("[labels     ] 1\n[label      ] evk-1\n"));
        assert!(text.contains("[envvar     ] [FOO] 1\n"));
    }

    #[test]
    fn reserved_name_is_rejected() {
        let err = build("master", &[], "boards/x", &[]).unwrap_err();
        assert!(matches!(err, BuildError::Config(ConfigError::ReservedName { .. })));
    }
}
