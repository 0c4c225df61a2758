//! Template contexts: flat, serializable views of the models.
//!
//! Everything order-sensitive in the rendered document is sorted here so the
//! templates only iterate.

use serde::Serialize;

use hottest_core::{AgentModel, JobModel, PipelineModel};

use crate::error::RenderError;

/// Command the server runs to launch an agent.
pub const AGENT_COMMAND: &str = "hottest/noderun.sh";

#[derive(Debug, Clone, Serialize)]
pub struct EnvVarCtx {
    pub name: String,
    pub value: String,
}

/// Agent configuration document payload.
#[derive(Debug, Clone, Serialize)]
pub struct NodeContext {
    pub name: String,
    pub description: String,
    pub remote_fs: String,
    pub agent_command: String,
    /// Labels joined by single spaces.
    pub label: String,
    /// Sorted by name.
    pub env_vars: Vec<EnvVarCtx>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterCtx {
    pub name: String,
    pub description: String,
    pub default: String,
}

/// Job configuration document payload.
#[derive(Debug, Clone, Serialize)]
pub struct JobContext {
    pub description: String,
    /// Labels joined by `&&`.
    pub assigned_node: String,
    /// Sorted by name.
    pub parameters: Vec<ParameterCtx>,
    pub script: String,
}

/// Pipeline configuration document payload.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineContext {
    pub timer_expr: String,
    pub script: String,
}

impl NodeContext {
    pub fn from_agent(agent: &AgentModel) -> Self {
        let mut env_vars: Vec<EnvVarCtx> = agent
            .env_vars
            .iter()
            .map(|(name, value)| EnvVarCtx {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        env_vars.sort_by(|a, b| a.name.cmp(&b.name));

        NodeContext {
            name: agent.name.clone(),
            description: agent.description.clone(),
            remote_fs: agent.remote_fs(),
            agent_command: AGENT_COMMAND.to_string(),
            label: agent.labels.iter().cloned().collect::<Vec<_>>().join(" "),
            env_vars,
        }
    }
}

impl JobContext {
    pub fn from_job(job: &JobModel) -> Self {
        let mut parameters: Vec<ParameterCtx> = job
            .parameters
            .iter()
            .map(|(name, p)| ParameterCtx {
                name: name.clone(),
                description: p.description.clone(),
                default: p.default.clone(),
            })
            .collect();
        parameters.sort_by(|a, b| a.name.cmp(&b.name));

        JobContext {
            description: job.description.clone(),
            assigned_node: job.labels.iter().cloned().collect::<Vec<_>>().join("&&"),
            parameters,
            script: job.script.clone(),
        }
    }
}

impl PipelineContext {
    pub fn from_pipeline(pipeline: &PipelineModel, script: String) -> Self {
        PipelineContext {
            timer_expr: pipeline.timer_expr.clone(),
            script,
        }
    }
}

/// Convert any context to a [`tera::Context`].
pub fn to_tera_context<T: Serialize>(ctx: &T) -> Result<tera::Context, RenderError> {
    tera::Context::from_serialize(ctx).map_err(RenderError::from)
}
