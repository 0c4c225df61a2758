//! Error types for hottest-core.

use std::path::PathBuf;

use thiserror::Error;

/// A definition, chunk or overlay document is malformed or inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading a document or script.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("on file \"{path}\": {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The expanded document does not satisfy its schema.
    #[error("on file \"{path}\" using schema \"{schema}\": {errors}")]
    Schema {
        path: PathBuf,
        schema: &'static str,
        errors: String,
    },

    /// A `#|ref` names an entry missing from the root `refs` table.
    #[error("on file \"{path}\": definition is missing referenced field: [refs][{name}]")]
    MissingReference { path: PathBuf, name: String },

    /// A `#|ref` is reached again on its own expansion branch.
    #[error("on file \"{path}\": definition has a circular reference to field: [refs][{name}]")]
    CircularReference { path: PathBuf, name: String },

    /// A referenced `refs` entry is not a mapping and cannot be merged.
    #[error("on file \"{path}\": referenced field [refs][{name}] is not an object")]
    ReferenceNotMapping { path: PathBuf, name: String },

    /// A script line starts like a directive but does not parse as one.
    #[error("{file}, line {line}: {message}")]
    Directive {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Two chunks of one assembly declare the same parameter.
    #[error("{file}: duplicated parameter on job: \"{name}\"")]
    DuplicateParameter { file: PathBuf, name: String },

    /// `#|parameter-default-override` targets a parameter nobody declared.
    #[error("unknown parameter on \"#|parameter-default-override\": {name} (override value is: \"{value}\")")]
    UnknownDefaultOverride { name: String, value: String },

    /// An overlay override map touches a key the base model lacks.
    #[error("{origin}: {what} \"{name}\" doesn't exist on the base model")]
    UnknownOverride {
        origin: String,
        what: &'static str,
        name: String,
    },

    /// A job requires an agent environment variable the agent does not define.
    #[error("agent \"{agent}\" is missing a required environment variable: {variable}")]
    MissingEnvVar { agent: String, variable: String },

    /// The name is reserved by the CI server.
    #[error("node name \"{name}\" is reserved")]
    ReservedName { name: String },

    /// Pipeline job names must not start with a separator.
    #[error("invalid job name: \"{name}\". pipeline job names can't start with \"/\"")]
    LeadingSlash { name: String },

    /// A directory given as include root is not a directory.
    #[error("path is not a directory: \"{path}\"")]
    NotADirectory { path: PathBuf },
}

/// A file named by suffix or logical path was not found in any search directory.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No directory holds both `<chunk>.json` and `<chunk>.sh`.
    #[error("could not find chunk files (json, sh or both): {chunk} (searched {searched} directories)")]
    Chunk { chunk: String, searched: usize },

    /// A parametrization file suffix matched nothing.
    #[error("on {item}: unable to find parametrization file with suffix: {suffix}")]
    Parametrization { item: String, suffix: String },

    /// A pipeline file suffix matched nothing.
    #[error("on pipeline {item}: unable to find pipeline file with suffix: {suffix}")]
    Pipeline { item: String, suffix: String },
}

/// Everything that can fail while building a model.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
