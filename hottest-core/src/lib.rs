//! hottest core library: definition loading, chunk assembly and models.
//!
//! - [`loader`] strips comments, expands references, validates against [`schema`]
//! - [`chunk`] and [`assembler`] compose job scripts from chunk pairs
//! - [`agent`], [`job`], [`pipeline`], [`folder`] build the models
//! - [`search`] holds the ordered lookup directories

pub mod agent;
pub mod assembler;
pub mod chunk;
pub mod error;
pub mod folder;
pub mod job;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod search;
pub mod types;

pub use agent::{AgentModel, AgentOverlay, RESERVED_AGENT};
pub use error::{BuildError, ConfigError, LookupError};
pub use folder::FolderModel;
pub use job::{JobModel, JobOverlay, JobSpec, Parameter};
pub use pipeline::{PipelineModel, StepRef};
pub use schema::Schema;
pub use search::SearchDirs;
pub use types::{CanonicalPath, TextLines};
