//! Capability interface to the CI server.
//!
//! Reads take `&self`, writes take `&mut self`. The network adapter lives in
//! the binary; [`crate::dry_run::DryRunServer`] wraps any implementation and
//! records writes instead of performing them.

use thiserror::Error;

use hottest_core::CanonicalPath;

/// Class reported by the server for freestyle jobs.
pub const JOB_CLASS: &str = "hudson.model.FreeStyleProject";
/// Class reported by the server for pipelines.
pub const PIPELINE_CLASS: &str = "org.jenkinsci.plugins.workflow.job.WorkflowJob";
/// Class reported by the server for folders.
pub const FOLDER_CLASS: &str = "com.cloudbees.hudson.plugins.folder.Folder";

/// Failure talking to the CI server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("{what} not found on the server")]
    NotFound { what: String },

    #[error("unable to write dry-run output: {0}")]
    Output(#[from] std::io::Error),
}

/// One entry of the server's item tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteJob {
    /// Leaf name, relative to the containing folder.
    pub name: String,
    pub class: String,
    /// Items inside, for folders.
    pub children: Vec<RemoteJob>,
}

impl RemoteJob {
    pub fn new(name: &str, class: &str) -> Self {
        RemoteJob {
            name: name.to_string(),
            class: class.to_string(),
            children: Vec::new(),
        }
    }

    pub fn folder(name: &str, children: Vec<RemoteJob>) -> Self {
        RemoteJob {
            children,
            ..RemoteJob::new(name, FOLDER_CLASS)
        }
    }
}

/// A desired configuration document plus its human-readable metadata dump.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifact {
    pub document: String,
    pub metadata: String,
}

pub trait CiServer {
    /// The full item tree, folders expanded.
    fn list_jobs(&self) -> Result<Vec<RemoteJob>, TransportError>;

    fn list_nodes(&self) -> Result<Vec<String>, TransportError>;

    fn get_job_config(&self, path: &CanonicalPath) -> Result<String, TransportError>;

    fn set_job_config(&mut self, path: &CanonicalPath, artifact: &Artifact)
        -> Result<(), TransportError>;

    /// Create `path` inside its (already existing) parent folder.
    fn create_job(&mut self, path: &CanonicalPath, artifact: &Artifact)
        -> Result<(), TransportError>;

    fn get_node_config(&self, name: &str) -> Result<String, TransportError>;

    fn set_node_config(&mut self, name: &str, artifact: &Artifact) -> Result<(), TransportError>;

    /// Create a minimal placeholder node, to be reconfigured right after.
    fn create_node(&mut self, name: &str) -> Result<(), TransportError>;

    /// Names of the parameters `path` declares.
    fn job_parameters(&self, path: &CanonicalPath) -> Result<Vec<String>, TransportError>;
}
