//! Job (test) model and its builder.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::agent;
use crate::assembler::Assembler;
use crate::chunk::{self, ChunkMeta};
use crate::error::{BuildError, ConfigError};
use crate::loader;
use crate::schema::Schema;
use crate::types::TextLines;

/// Chunk assembled before the agent chunk of every job.
pub const HEADER_CHUNK: &str = "runtime/header";
/// Chunk assembled after the job chunk of every job.
pub const FOOTER_CHUNK: &str = "runtime/footer";

/// A string parameter exposed by the job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    pub description: String,
    pub default: String,
}

/// A single CI job, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobModel {
    pub name: String,
    pub description: String,
    pub required_env: IndexSet<String>,
    pub parameters: IndexMap<String, Parameter>,
    pub labels: IndexSet<String>,
    pub script: String,
}

/// Parametrization overlay for a job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobOverlay {
    #[serde(default)]
    pub test_labels_extra: Vec<String>,
    #[serde(default)]
    pub parameter_default_overrides: IndexMap<String, TextLines>,
}

impl JobOverlay {
    /// Load and validate an overlay file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        loader::load_as(path, Some(Schema::JobOverlay))
    }
}

/// Inputs for [`build`].
#[derive(Debug, Clone, Default)]
pub struct JobSpec {
    pub search_dirs: Vec<PathBuf>,
    pub agent_chunk: String,
    pub job_chunk: String,
    pub extra_labels: Vec<String>,
    pub overlay_files: Vec<PathBuf>,
}

impl JobModel {
    /// Layer an overlay on top of the model.
    ///
    /// Labels are added freely; default overrides may only touch parameters
    /// the job already declares. `origin` names the overlay in errors.
    pub fn apply_overlay(&mut self, overlay: &JobOverlay, origin: &str) -> Result<(), ConfigError> {
        for label in &overlay.test_labels_extra {
            self.labels.insert(label.clone());
        }
        for (name, value) in &overlay.parameter_default_overrides {
            let Some(parameter) = self.parameters.get_mut(name) else {
                return Err(ConfigError::UnknownOverride {
                    origin: origin.to_string(),
                    what: "parameter",
                    name: name.clone(),
                });
            };
            parameter.default = value.joined();
        }
        Ok(())
    }
}

/// Assemble header, agent chunk, job chunk and footer into one job.
///
/// Pending default overrides are applied once every chunk is in, extra labels
/// are added, required agent variables are checked against the bare agent
/// chunk, and finally the overlay files are layered in order.
pub fn build(spec: &JobSpec) -> Result<JobModel, BuildError> {
    let mut assembler = Assembler::new(&spec.search_dirs);
    assembler.add_root(HEADER_CHUNK, Schema::JobChunk)?;
    assembler.add_root(&spec.agent_chunk, Schema::AgentChunk)?;
    assembler.add_root(&spec.job_chunk, Schema::JobChunk)?;
    assembler.add_root(FOOTER_CHUNK, Schema::JobChunk)?;
    let assembly = assembler.finish()?;

    let job_prefix = chunk::require(&spec.search_dirs, &spec.job_chunk)?;
    let job_meta: ChunkMeta =
        loader::load_as(&chunk::metadata_path(&job_prefix), Some(Schema::JobChunk))?;

    let mut labels = assembly.labels;
    for label in &spec.extra_labels {
        labels.insert(label.clone());
    }

    let probe = agent::from_chunk("probe", &spec.search_dirs, &spec.agent_chunk)?;
    if let Some(missing) = assembly
        .required_env
        .iter()
        .find(|name| !probe.env_vars.contains_key(*name))
    {
        return Err(ConfigError::MissingEnvVar {
            agent: spec.agent_chunk.clone(),
            variable: missing.clone(),
        }
        .into());
    }

    let mut model = JobModel {
        name: job_name(&spec.agent_chunk, &spec.job_chunk),
        description: job_meta.description.map(|t| t.joined()).unwrap_or_default(),
        required_env: assembly.required_env,
        parameters: assembly.parameters,
        labels,
        script: assembly.script,
    };

    for file in &spec.overlay_files {
        let overlay = JobOverlay::load(file)?;
        model.apply_overlay(&overlay, &file.display().to_string())?;
    }
    Ok(model)
}

/// `<job chunk base name>-<agent chunk base name>`
pub fn job_name(agent_chunk: &str, job_chunk: &str) -> String {
    format!(
        "{}-{}",
        last_segment(job_chunk),
        last_segment(agent_chunk)
    )
}

fn last_segment(logical: &str) -> &str {
    logical.rsplit('/').next().unwrap_or(logical)
}

impl fmt::Display for JobModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[name       ] {}", self.name)?;
        writeln!(f, "[description] {}", self.description)?;
        writeln!(f, "[labels     ] {}", self.labels.len())?;
        for label in &self.labels {
            writeln!(f, "[label      ] {label}")?;
        }
        writeln!(f, "[parameters ] {}", self.parameters.len())?;
        for (name, parameter) in &self.parameters {
            writeln!(f, "[parameter  ] [{name}] {}", parameter.default)?;
        }
        Ok(())
    }
}
