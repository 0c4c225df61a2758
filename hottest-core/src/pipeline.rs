//! Pipeline model: jobs, serial sequences and the main execution sequence.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::loader;
use crate::schema::Schema;
use crate::types::CanonicalPath;

/// Parameters passed to one triggered job.
pub type JobParams = IndexMap<String, String>;

/// One unit launched inside an execution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRef {
    Job(String),
    Sequence(String),
}

impl StepRef {
    pub fn name(&self) -> &str {
        match self {
            StepRef::Job(name) | StepRef::Sequence(name) => name,
        }
    }
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A multi-job orchestration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineModel {
    /// Cron expression for the timer trigger; empty disables it.
    pub timer_expr: String,
    /// Every job the pipeline triggers, in registration order.
    pub jobs: IndexMap<String, JobParams>,
    pub sequences: IndexMap<String, Vec<String>>,
    /// Steps run in order; the refs of one step run concurrently.
    pub steps: Vec<Vec<StepRef>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PipelineDoc {
    #[serde(default)]
    jenkins_cron_expression: Option<String>,
    #[serde(default)]
    parametrized_tests: IndexMap<String, JobParams>,
    #[serde(default)]
    serial_execution_sequences: IndexMap<String, Vec<String>>,
    main_execution_sequence: Vec<SeqItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeqItem {
    One(String),
    Many(Vec<String>),
}

impl SeqItem {
    fn into_vec(self) -> Vec<String> {
        match self {
            SeqItem::One(name) => vec![name],
            SeqItem::Many(names) => names,
        }
    }
}

/// Load a pipeline definition file and build its model.
pub fn build(path: &Path, root_folder: &str) -> Result<PipelineModel, ConfigError> {
    let doc = loader::load(path, Some(Schema::Pipeline))?;
    parse(path, doc, root_folder)
}

/// Build a model from an already loaded and validated document.
///
/// Job names are placed under `root_folder` and canonicalised. Sequence names
/// are kept as written. Jobs are registered in the order parametrized jobs,
/// sequence members, main sequence references.
pub fn parse(path: &Path, doc: Value, root_folder: &str) -> Result<PipelineModel, ConfigError> {
    let doc: PipelineDoc = loader::from_value(path, doc)?;
    let root = CanonicalPath::new(root_folder);
    let job_path = |name: &str| root.join(name).to_string();

    let mut model = PipelineModel {
        timer_expr: doc.jenkins_cron_expression.unwrap_or_default(),
        ..PipelineModel::default()
    };

    for (job, params) in doc.parametrized_tests {
        model.jobs.insert(job_path(&job), params);
    }

    for (name, members) in doc.serial_execution_sequences {
        let members: Vec<String> = members.iter().map(|job| job_path(job)).collect();
        for job in &members {
            model.register(job);
        }
        model.sequences.insert(name, members);
    }

    for item in doc.main_execution_sequence {
        let mut step = Vec::new();
        for name in item.into_vec() {
            if model.sequences.contains_key(&name) {
                step.push(StepRef::Sequence(name));
            } else {
                let job = job_path(&name);
                model.register(&job);
                step.push(StepRef::Job(job));
            }
        }
        model.steps.push(step);
    }

    Ok(model)
}

impl PipelineModel {
    fn register(&mut self, job: &str) {
        if !self.jobs.contains_key(job) {
            self.jobs.insert(job.to_string(), JobParams::new());
        }
    }
}

impl fmt::Display for PipelineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[timer_expr ] {}", self.timer_expr)?;
        writeln!(f, "[tests      ] {}", self.jobs.len())?;
        for (job, params) in &self.jobs {
            writeln!(f, "[testname   ] {job}")?;
            writeln!(f, "[testparams ] {}", params.len())?;
            for (name, value) in params {
                writeln!(f, "[testparam  ] [{name}] {value}")?;
            }
        }
        writeln!(f, "[serial_seqs] {}", self.sequences.len())?;
        for (name, members) in &self.sequences {
            writeln!(f, "[serial_seq ] [{name}] {}", members.len())?;
            for job in members {
                writeln!(f, "[serial_seq ] [{name}] {job}")?;
            }
        }
        writeln!(f, "[executions ] {}", self.steps.len())?;
        for (idx, step) in self.steps.iter().enumerate() {
            writeln!(f, "[execution  ] [{idx}] {}", step.len())?;
            for item in step {
                writeln!(f, "[execution  ] [{idx}] {item}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p() -> &'static Path {
        Path::new("pipe.json")
    }

    #[test]
    fn nested_list_is_one_concurrent_step() {
        let doc = json!({ "main-execution-sequence": [["X", "Y"], "Z"] });
        let m = parse(p(), doc, "test").unwrap();
        assert_eq!(
            m.steps,
            vec![
                vec![StepRef::Job("test/X".into()), StepRef::Job("test/Y".into())],
                vec![StepRef::Job("test/Z".into())],
            ]
        );
        let jobs: Vec<&String> = m.jobs.keys().collect();
        assert_eq!(jobs, vec!["test/X", "test/Y", "test/Z"]);
    }

    #[test]
    fn sequence_names_are_not_prefixed() {
        let doc = json!({
            "serial-execution-sequences": { "flash": ["/a", "b//"] },
            "main-execution-sequence": ["flash", "c"]
        });
        let m = parse(p(), doc, "/ci/").unwrap();
        assert_eq!(m.sequences["flash"], vec!["ci/a", "ci/b"]);
        assert_eq!(m.steps[0], vec![StepRef::Sequence("flash".into())]);
        assert_eq!(m.steps[1], vec![StepRef::Job("ci/c".into())]);
    }

    #[test]
    fn parametrized_jobs_register_first_and_keep_params() {
        let doc = json!({
            "parametrized-tests": { "z": { "LOOPS": "3" } },
            "main-execution-sequence": ["a", "z"]
        });
        let m = parse(p(), doc, "test").unwrap();
        let jobs: Vec<&String> = m.jobs.keys().collect();
        assert_eq!(jobs, vec!["test/z", "test/a"]);
        assert_eq!(m.jobs["test/z"]["LOOPS"], "3");
        assert!(m.jobs["test/a"].is_empty());
    }

    #[test]
    fn missing_cron_is_empty() {
        let m = parse(p(), json!({ "main-execution-sequence": [] }), "").unwrap();
        assert_eq!(m.timer_expr, "");
        assert!(m.to_string().starts_with("[timer_expr ] \n[tests      ] 0\n"));
    }
}
