//! Embedded JSON schemas for every document kind the loader validates.

use std::collections::HashMap;
use std::path::Path;

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::ConfigError;

static COMPILED: Lazy<HashMap<Schema, Result<JSONSchema, String>>> =
    Lazy::new(|| Schema::all().iter().map(|&s| (s, s.compile())).collect());

/// The document kinds with a schema baked into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    /// Sync definition (`nodes` / `tests` / `pipelines`).
    Sync,
    /// Metadata half of an agent (board) chunk.
    AgentChunk,
    /// Metadata half of a job (test) chunk, also used for header, footer and includes.
    JobChunk,
    /// Agent parametrization overlay.
    AgentOverlay,
    /// Job parametrization overlay.
    JobOverlay,
    /// Pipeline definition.
    Pipeline,
}

impl Schema {
    /// All schemas in a stable order.
    pub fn all() -> &'static [Schema] {
        &[
            Schema::Sync,
            Schema::AgentChunk,
            Schema::JobChunk,
            Schema::AgentOverlay,
            Schema::JobOverlay,
            Schema::Pipeline,
        ]
    }

    /// File name the schema is known by in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Schema::Sync => "sync.schema.json",
            Schema::AgentChunk => "chunk-agent.schema.json",
            Schema::JobChunk => "chunk-job.schema.json",
            Schema::AgentOverlay => "overlay-agent.schema.json",
            Schema::JobOverlay => "overlay-job.schema.json",
            Schema::Pipeline => "pipeline.schema.json",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Schema::Sync => include_str!("schemas/sync.schema.json"),
            Schema::AgentChunk => include_str!("schemas/chunk-agent.schema.json"),
            Schema::JobChunk => include_str!("schemas/chunk-job.schema.json"),
            Schema::AgentOverlay => include_str!("schemas/overlay-agent.schema.json"),
            Schema::JobOverlay => include_str!("schemas/overlay-job.schema.json"),
            Schema::Pipeline => include_str!("schemas/pipeline.schema.json"),
        }
    }

    fn compile(self) -> Result<JSONSchema, String> {
        let schema: Value = serde_json::from_str(self.source())
            .map_err(|e| format!("invalid embedded schema JSON: {e}"))?;
        JSONSchema::compile(&schema).map_err(|e| format!("failed to compile JSON schema: {e}"))
    }

    /// The compiled schema, built on first use and shared afterwards.
    fn compiled(self) -> Result<&'static JSONSchema, String> {
        match COMPILED.get(&self) {
            Some(Ok(compiled)) => Ok(compiled),
            Some(Err(e)) => Err(e.clone()),
            None => Err(format!("no compiled schema for {}", self.name())),
        }
    }

    /// Validate `doc` (read from `path`) against this schema.
    pub fn validate(self, doc: &Value, path: &Path) -> Result<(), ConfigError> {
        let fail = |errors: String| ConfigError::Schema {
            path: path.to_path_buf(),
            schema: self.name(),
            errors,
        };

        let compiled = self.compiled().map_err(fail)?;

        let result = compiled.validate(doc);
        if let Err(errors) = result {
            let messages: Vec<String> = errors
                .map(|e| format!("{} at \"{}\"", e, e.instance_path))
                .collect();
            return Err(fail(messages.join("; ")));
        }
        Ok(())
    }
}
