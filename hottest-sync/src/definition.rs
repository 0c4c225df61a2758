//! Sync definition documents and the desired state built from them.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use hottest_core::{
    agent, job, loader, pipeline, AgentOverlay, CanonicalPath, ConfigError, JobOverlay, JobSpec,
    Schema, SearchDirs, RESERVED_AGENT,
};
use hottest_renderer::Renderer;

use crate::error::SyncError;
use crate::item::{DesiredItem, DesiredSet, ItemKind, JobRef};
use crate::transport::Artifact;
use crate::whitelist::Whitelist;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeEntry {
    pub board_chunk: String,
    #[serde(default)]
    pub parametrization_files: Vec<String>,
    #[serde(default)]
    pub parametrization_inline: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestEntry {
    pub board_chunk: String,
    pub test_chunk: String,
    #[serde(default)]
    pub extra_labels: Vec<String>,
    #[serde(default)]
    pub parametrization_files: Vec<String>,
    #[serde(default)]
    pub parametrization_inline: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineEntry {
    pub file: String,
}

/// A loaded sync definition file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncDefinition {
    #[serde(default)]
    pub nodes: IndexMap<String, NodeEntry>,
    #[serde(default)]
    pub tests: IndexMap<String, TestEntry>,
    #[serde(default)]
    pub pipelines: IndexMap<String, PipelineEntry>,
    #[serde(skip)]
    pub path: PathBuf,
}

impl SyncDefinition {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut def: SyncDefinition = loader::load_as(path, Some(Schema::Sync))?;
        def.path = path.to_path_buf();
        Ok(def)
    }
}

/// Builds the desired set of each kind from a definition.
pub struct Planner<'a> {
    pub dirs: &'a SearchDirs,
    pub root_folder: CanonicalPath,
    pub whitelist: &'a Whitelist,
    pub renderer: &'a Renderer,
}

fn inline_origin(name: &CanonicalPath) -> String {
    format!("sync's \"parametrization-inline\" for \"{name}\"")
}

impl<'a> Planner<'a> {
    fn overlay_files(&self, item: &CanonicalPath, suffixes: &[String]) -> Result<Vec<PathBuf>, SyncError> {
        suffixes
            .iter()
            .map(|s| {
                self.dirs
                    .find_parametrization(item.as_str(), s)
                    .map_err(SyncError::from)
            })
            .collect()
    }

    /// Agents. Names are canonicalised but not placed under the root folder.
    pub fn nodes(&self, def: &SyncDefinition) -> Result<DesiredSet, SyncError> {
        let mut set = DesiredSet::new(ItemKind::Node);
        for (raw, entry) in &def.nodes {
            let name = CanonicalPath::new(raw);
            if name.as_str() == RESERVED_AGENT {
                return Err(ConfigError::ReservedName {
                    name: name.to_string(),
                }
                .into());
            }
            set.full.insert(name.clone());
            let overlays = self.overlay_files(&name, &entry.parametrization_files)?;
            if !self.whitelist.matches(name.as_str()) {
                continue;
            }

            tracing::info!("node \"{name}\": generating");
            let mut model = agent::build(name.as_str(), &self.dirs.chunks, &entry.board_chunk, &overlays)?;
            if let Some(inline) = &entry.parametrization_inline {
                Schema::AgentOverlay.validate(inline, &def.path)?;
                let overlay: AgentOverlay = loader::from_value(&def.path, inline.clone())?;
                model.apply_overlay(&overlay, &inline_origin(&name))?;
            }
            set.items.push(DesiredItem {
                path: name,
                artifact: Artifact {
                    document: self.renderer.render_agent(&model)?,
                    metadata: model.to_string(),
                },
                job_refs: Vec::new(),
            });
        }
        Ok(set)
    }

    /// Freestyle jobs, placed under the root folder.
    pub fn jobs(&self, def: &SyncDefinition) -> Result<DesiredSet, SyncError> {
        let mut set = DesiredSet::new(ItemKind::Job);
        for (raw, entry) in &def.tests {
            let name = self.root_folder.join(raw);
            set.full.insert(name.clone());
            let overlays = self.overlay_files(&name, &entry.parametrization_files)?;
            if !self.whitelist.matches(name.as_str()) {
                continue;
            }

            tracing::info!("job \"{name}\": generating");
            let spec = JobSpec {
                search_dirs: self.dirs.chunks.clone(),
                agent_chunk: entry.board_chunk.clone(),
                job_chunk: entry.test_chunk.clone(),
                extra_labels: entry.extra_labels.clone(),
                overlay_files: overlays,
            };
            let mut model = job::build(&spec)?;
            if let Some(inline) = &entry.parametrization_inline {
                Schema::JobOverlay.validate(inline, &def.path)?;
                let overlay: JobOverlay = loader::from_value(&def.path, inline.clone())?;
                model.apply_overlay(&overlay, &inline_origin(&name))?;
            }
            set.items.push(DesiredItem {
                path: name,
                artifact: Artifact {
                    document: self.renderer.render_job(&model)?,
                    metadata: model.to_string(),
                },
                job_refs: Vec::new(),
            });
        }
        Ok(set)
    }

    /// Pipelines, placed under the root folder; their jobs are resolved
    /// against the same root folder.
    pub fn pipelines(&self, def: &SyncDefinition) -> Result<DesiredSet, SyncError> {
        let mut set = DesiredSet::new(ItemKind::Pipeline);
        for (raw, entry) in &def.pipelines {
            let name = self.root_folder.join(raw);
            set.full.insert(name.clone());
            let file = self.dirs.find_pipeline(name.as_str(), &entry.file)?;
            if !self.whitelist.matches(name.as_str()) {
                continue;
            }

            tracing::info!("pipeline \"{name}\": generating");
            let model = pipeline::build(&file, self.root_folder.as_str())?;
            let job_refs = model
                .jobs
                .iter()
                .map(|(job, params)| JobRef {
                    job: CanonicalPath::new(job),
                    params: params.clone(),
                })
                .collect();
            set.items.push(DesiredItem {
                path: name,
                artifact: Artifact {
                    document: self.renderer.render_pipeline(&model)?,
                    metadata: model.to_string(),
                },
                job_refs,
            });
        }
        Ok(set)
    }
}
