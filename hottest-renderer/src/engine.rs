//! Tera rendering engine: [`ArtifactKind`] and [`Renderer`].
//!
//! | Kind     | Template             | Root element                                  |
//! |----------|----------------------|-----------------------------------------------|
//! | Node     | `node.xml.tera`      | `slave`                                       |
//! | Job      | `job.xml.tera`       | `project`                                     |
//! | Pipeline | `pipeline.xml.tera`  | `flow-definition`                             |
//! | Folder   | `folder.xml.tera`    | `com.cloudbees.hudson.plugins.folder.Folder`  |

use std::collections::HashMap;

use serde_json::Value;
use tera::Tera;

use hottest_core::{AgentModel, FolderModel, JobModel, PipelineModel};

use crate::context::{to_tera_context, JobContext, NodeContext, PipelineContext};
use crate::error::RenderError;
use crate::groovy;

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("node.xml.tera", include_str!("templates/node.xml.tera")),
    ("job.xml.tera", include_str!("templates/job.xml.tera")),
    ("pipeline.xml.tera", include_str!("templates/pipeline.xml.tera")),
    ("folder.xml.tera", include_str!("templates/folder.xml.tera")),
];

/// `xml` filter: escape text for element content and attribute values.
fn xml_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(Value::String(escape_xml(&text)))
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn build_tera() -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.register_filter("xml", xml_filter);
    tera.add_raw_templates(TPLS.iter().copied())?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// Every configuration document the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Node,
    Job,
    Pipeline,
    Folder,
}

impl ArtifactKind {
    pub fn all() -> &'static [ArtifactKind] {
        &[
            ArtifactKind::Node,
            ArtifactKind::Job,
            ArtifactKind::Pipeline,
            ArtifactKind::Folder,
        ]
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            ArtifactKind::Node     => "node.xml.tera",
            ArtifactKind::Job      => "job.xml.tera",
            ArtifactKind::Pipeline => "pipeline.xml.tera",
            ArtifactKind::Folder   => "folder.xml.tera",
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders models into configuration documents.
///
/// Create once with [`Renderer::new`] and reuse.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { tera: build_tera()? })
    }

    fn render(&self, kind: ArtifactKind, ctx: &tera::Context) -> Result<String, RenderError> {
        Ok(self.tera.render(kind.template_name(), ctx)?)
    }

    pub fn render_agent(&self, agent: &AgentModel) -> Result<String, RenderError> {
        let ctx = to_tera_context(&NodeContext::from_agent(agent))?;
        self.render(ArtifactKind::Node, &ctx)
    }

    pub fn render_job(&self, job: &JobModel) -> Result<String, RenderError> {
        let ctx = to_tera_context(&JobContext::from_job(job))?;
        self.render(ArtifactKind::Job, &ctx)
    }

    /// Render the pipeline document; the generated script is embedded in it.
    pub fn render_pipeline(&self, pipeline: &PipelineModel) -> Result<String, RenderError> {
        let script = groovy::pipeline_script(pipeline)?;
        let ctx = to_tera_context(&PipelineContext::from_pipeline(pipeline, script))?;
        self.render(ArtifactKind::Pipeline, &ctx)
    }

    pub fn render_folder(&self, _folder: &FolderModel) -> Result<String, RenderError> {
        self.render(ArtifactKind::Folder, &tera::Context::new())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
