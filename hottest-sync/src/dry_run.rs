//! Recording adapter: forwards reads, records writes instead of performing them.

use std::collections::HashSet;
use std::io::Write;

use similar::TextDiff;

use hottest_core::CanonicalPath;

use crate::transport::{Artifact, CiServer, RemoteJob, TransportError};

/// What a dry run prints for every recorded write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DumpMode {
    /// Log lines only.
    #[default]
    None,
    /// The full desired document.
    Document,
    /// The model metadata listing.
    Metadata,
    /// Unified diff from the live document to the desired one.
    Diff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    CreateJob,
    SetJobConfig,
    CreateNode,
    SetNodeConfig,
}

/// One write the wrapped server would have received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub op: WriteOp,
    pub target: String,
}

pub struct DryRunServer<S, W> {
    inner: S,
    out: W,
    mode: DumpMode,
    /// Nodes "created" during this run; they have no live document.
    placeholders: HashSet<String>,
    pub recorded: Vec<Recorded>,
}

impl<S: CiServer, W: Write> DryRunServer<S, W> {
    pub fn new(inner: S, out: W, mode: DumpMode) -> Self {
        DryRunServer {
            inner,
            out,
            mode,
            placeholders: HashSet::new(),
            recorded: Vec::new(),
        }
    }

    pub fn into_parts(self) -> (S, W) {
        (self.inner, self.out)
    }

    fn dump(&mut self, name: &str, live: Option<String>, artifact: &Artifact) -> Result<(), TransportError> {
        let rule = "-".repeat(20);
        match self.mode {
            DumpMode::None => {}
            DumpMode::Document => {
                writeln!(self.out, "---XML dump for: \"{name}\"{rule}")?;
                writeln!(self.out, "{}", artifact.document)?;
            }
            DumpMode::Metadata => {
                writeln!(self.out, "---Metadata for: \"{name}\"{rule}")?;
                writeln!(self.out, "{}", artifact.metadata)?;
            }
            DumpMode::Diff => {
                let live = live.unwrap_or_default();
                writeln!(self.out, "---Diff for: \"{name}\"{rule}")?;
                if live == artifact.document {
                    writeln!(self.out, "(no changes)")?;
                } else {
                    let unified = TextDiff::from_lines(&live, &artifact.document)
                        .unified_diff()
                        .header(&format!("a/{name}"), &format!("b/{name}"))
                        .context_radius(3)
                        .to_string();
                    write!(self.out, "{unified}")?;
                }
            }
        }
        Ok(())
    }

    fn live_job(&self, path: &CanonicalPath) -> Result<Option<String>, TransportError> {
        if self.mode == DumpMode::Diff {
            self.inner.get_job_config(path).map(Some)
        } else {
            Ok(None)
        }
    }

    fn record(&mut self, op: WriteOp, target: &str) {
        tracing::debug!("[dry-run] {op:?} {target}");
        self.recorded.push(Recorded {
            op,
            target: target.to_string(),
        });
    }
}

impl<S: CiServer, W: Write> CiServer for DryRunServer<S, W> {
    fn list_jobs(&self) -> Result<Vec<RemoteJob>, TransportError> {
        self.inner.list_jobs()
    }

    fn list_nodes(&self) -> Result<Vec<String>, TransportError> {
        self.inner.list_nodes()
    }

    fn get_job_config(&self, path: &CanonicalPath) -> Result<String, TransportError> {
        self.inner.get_job_config(path)
    }

    fn set_job_config(&mut self, path: &CanonicalPath, artifact: &Artifact) -> Result<(), TransportError> {
        let live = self.live_job(path)?;
        self.record(WriteOp::SetJobConfig, path.as_str());
        self.dump(path.as_str(), live, artifact)
    }

    fn create_job(&mut self, path: &CanonicalPath, artifact: &Artifact) -> Result<(), TransportError> {
        self.record(WriteOp::CreateJob, path.as_str());
        self.dump(path.as_str(), None, artifact)
    }

    fn get_node_config(&self, name: &str) -> Result<String, TransportError> {
        self.inner.get_node_config(name)
    }

    fn set_node_config(&mut self, name: &str, artifact: &Artifact) -> Result<(), TransportError> {
        let live = if self.mode == DumpMode::Diff && !self.placeholders.contains(name) {
            Some(self.inner.get_node_config(name)?)
        } else {
            None
        };
        self.record(WriteOp::SetNodeConfig, name);
        self.dump(name, live, artifact)
    }

    fn create_node(&mut self, name: &str) -> Result<(), TransportError> {
        self.placeholders.insert(name.to_string());
        self.record(WriteOp::CreateNode, name);
        Ok(())
    }

    fn job_parameters(&self, path: &CanonicalPath) -> Result<Vec<String>, TransportError> {
        self.inner.job_parameters(path)
    }
}
