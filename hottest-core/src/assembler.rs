//! Script assembler: composes a job from chunks.
//!
//! Each chunk contributes labels and parameters from its metadata and lines
//! from its script. Script lines starting with `#|` may be directives:
//!
//! ```text
//! #|board-require-env <NAME>
//! #|include <chunk/path>
//! #|parameter-default-override <NAME value>
//! ```
//!
//! Everything else is copied verbatim, bracketed per chunk by a
//! `# File contents of: ...` marker whose `#` count is the include depth.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::chunk::{self, ChunkMeta};
use crate::error::{io_err, BuildError, ConfigError};
use crate::job::Parameter;
use crate::loader;
use crate::schema::Schema;

const REQUIRE_ENV: &str = "#|board-require-env";
const INCLUDE: &str = "#|include";
const DEFAULT_OVERRIDE: &str = "#|parameter-default-override";

static REQUIRE_ENV_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#\|board-require-env +<([A-Za-z_][A-Za-z0-9_]*)>$").expect("static regex")
});
static INCLUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#\|include +<([A-Za-z0-9/_\-\.]*)>$").expect("static regex"));
static DEFAULT_OVERRIDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#\|parameter-default-override +<([A-Za-z_][A-Za-z0-9_]*) +(.*)>$")
        .expect("static regex")
});

/// A recognised directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    RequireEnv(String),
    Include(String),
    DefaultOverride { name: String, value: String },
}

/// Classify a trimmed script line.
///
/// `None` means an ordinary line. `Some(Err(msg))` means the line starts
/// like a directive but is malformed.
pub fn parse_directive(line: &str) -> Option<Result<Directive, String>> {
    let invalid = |kind: &str| Err(format!("Invalid {kind} directive: {line}"));

    if line.starts_with(REQUIRE_ENV) {
        return Some(match REQUIRE_ENV_RE.captures(line) {
            Some(c) => Ok(Directive::RequireEnv(c[1].to_string())),
            None => invalid(REQUIRE_ENV),
        });
    }
    if line.starts_with(INCLUDE) {
        return Some(match INCLUDE_RE.captures(line) {
            Some(c) => Ok(Directive::Include(c[1].to_string())),
            None => invalid(INCLUDE),
        });
    }
    if line.starts_with(DEFAULT_OVERRIDE) {
        return Some(match DEFAULT_OVERRIDE_RE.captures(line) {
            Some(c) => Ok(Directive::DefaultOverride {
                name: c[1].to_string(),
                value: unquote(&c[2]).to_string(),
            }),
            None => invalid(DEFAULT_OVERRIDE),
        });
    }
    None
}

/// Strip one matching pair of surrounding `"` or `'`.
fn unquote(value: &str) -> &str {
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Everything accumulated over one assembly.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub labels: IndexSet<String>,
    pub parameters: IndexMap<String, Parameter>,
    pub required_env: IndexSet<String>,
    pub script: String,
    /// Default overrides collected from directives, applied by [`Assembler::finish`].
    pub pending_overrides: IndexMap<String, String>,
}

/// Walks chunks for one job, tracking which chunk files were already processed.
pub struct Assembler<'a> {
    search_dirs: &'a [PathBuf],
    included: HashSet<PathBuf>,
    out: Assembly,
}

impl<'a> Assembler<'a> {
    pub fn new(search_dirs: &'a [PathBuf]) -> Self {
        Assembler {
            search_dirs,
            included: HashSet::new(),
            out: Assembly {
                script: "#!/bin/bash\n".to_string(),
                ..Assembly::default()
            },
        }
    }

    /// Resolve `logical` in the search dirs and process it at depth 1.
    pub fn add_root(&mut self, logical: &str, schema: Schema) -> Result<(), BuildError> {
        let prefix = chunk::require(self.search_dirs, logical)?;
        if !self.included.insert(prefix.clone()) {
            self.guard_note(1, logical);
            return Ok(());
        }
        self.process(&prefix, schema, 1)
    }

    fn guard_note(&mut self, depth: usize, logical: &str) {
        tracing::debug!("include of {logical} guarded");
        self.out.script.push_str(&format!(
            "{} hottest: #|include <{}> was guarded\n",
            "#".repeat(depth),
            logical
        ));
    }

    fn process(&mut self, prefix: &Path, schema: Schema, depth: usize) -> Result<(), BuildError> {
        let meta_file = chunk::metadata_path(prefix);
        let meta: ChunkMeta = loader::load_as(&meta_file, Some(schema))?;

        for label in meta.test_labels {
            self.out.labels.insert(label);
        }
        for (name, spec) in meta.parameters {
            if self.out.parameters.contains_key(&name) {
                return Err(ConfigError::DuplicateParameter {
                    file: meta_file,
                    name,
                }
                .into());
            }
            let parameter = Parameter {
                description: spec.description.map(|t| t.joined()).unwrap_or_default(),
                default: spec.default.map(|t| t.joined()).unwrap_or_default(),
            };
            self.out.parameters.insert(name, parameter);
        }

        let script_file = chunk::script_path(prefix);
        let text = std::fs::read_to_string(&script_file).map_err(|e| io_err(&script_file, e))?;
        let hashes = "#".repeat(depth);
        self.out.script.push_str(&format!(
            "\n{hashes} File contents of: {} {hashes}\n",
            script_file.display()
        ));

        for (idx, line) in text.split_inclusive('\n').enumerate() {
            let directive = match parse_directive(line.trim()) {
                None => {
                    self.out.script.push_str(line);
                    if !line.ends_with('\n') {
                        self.out.script.push('\n');
                    }
                    continue;
                }
                Some(parsed) => parsed.map_err(|message| ConfigError::Directive {
                    file: script_file.clone(),
                    line: idx + 1,
                    message,
                })?,
            };

            match directive {
                Directive::RequireEnv(name) => {
                    self.out.required_env.insert(name);
                }
                Directive::DefaultOverride { name, value } => {
                    self.out.pending_overrides.insert(name, value);
                }
                Directive::Include(logical) => {
                    let Some(included) = chunk::resolve(self.search_dirs, &logical) else {
                        return Err(ConfigError::Directive {
                            file: script_file.clone(),
                            line: idx + 1,
                            message: format!(
                                "could not find chunk files for #|include <{logical}> (json, sh or both)"
                            ),
                        }
                        .into());
                    };
                    if self.included.insert(included.clone()) {
                        self.process(&included, Schema::JobChunk, depth + 1)?;
                    } else {
                        self.guard_note(depth, &logical);
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply pending default overrides and hand back the assembly.
    pub fn finish(mut self) -> Result<Assembly, ConfigError> {
        for (name, value) in &self.out.pending_overrides {
            let Some(parameter) = self.out.parameters.get_mut(name) else {
                return Err(ConfigError::UnknownDefaultOverride {
                    name: name.clone(),
                    value: value.clone(),
                });
            };
            parameter.default = value.clone();
        }
        Ok(self.out)
    }
}
