//! Pipeline control-flow script generation.
//!
//! Every job is triggered with `propagate: false`; a non-SUCCESS result is
//! recorded in a shared `failed` map and flips the build result, so one
//! failing job never aborts the rest of its step. The failure map is printed
//! once all steps are done.

use std::fmt::Write;

use hottest_core::{ConfigError, PipelineModel, StepRef};

use crate::error::RenderError;

const PREAMBLE: &str = r#"jobs    = [:]
failed  = [:]
def add_to_jobs(name, params=[]) {
  jobs[name] = {
    stage(name) {
      def ret =
        build job: name,
        parameters: params,
        propagate: false
      if (ret.getResult() != "SUCCESS") {
        currentBuild.result = "FAILURE"
        failed[name] = "${ret.getResult()}. URL: ${ret.getAbsoluteUrl()}"
      }
      return ret
    }
  }
}
"#;

const EPILOGUE: &str = r#"for (def v in failed) {
  println "${v.key}: ${v.value}"
}
"#;

/// Escape a value for use inside a double-quoted groovy string.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Generate the groovy script driving `pipeline`.
pub fn pipeline_script(pipeline: &PipelineModel) -> Result<String, RenderError> {
    if let Some(bad) = pipeline.jobs.keys().find(|name| name.starts_with('/')) {
        return Err(ConfigError::LeadingSlash { name: bad.clone() }.into());
    }
    let mut s = String::from(PREAMBLE);
    write_script(&mut s, pipeline)?;
    Ok(s)
}

fn write_script<W: Write>(s: &mut W, pipeline: &PipelineModel) -> std::fmt::Result {
    for (name, params) in &pipeline.jobs {
        if params.is_empty() {
            writeln!(s, "add_to_jobs (\"{}\")", quote(name))?;
        } else {
            writeln!(s, "add_to_jobs(")?;
            writeln!(s, "  \"{}\", [", quote(name))?;
            for (param, value) in params {
                writeln!(
                    s,
                    "    string(name: \"{}\", value: \"{}\"),",
                    quote(param),
                    quote(value)
                )?;
            }
            writeln!(s, "  ])")?;
        }
    }
    writeln!(s)?;

    writeln!(s, "def seqs = [:]")?;
    for (seq, members) in &pipeline.sequences {
        writeln!(s, "seqs[\"{}\"] = {{", quote(seq))?;
        writeln!(s, "  stage(\"{}\"){{", quote(seq))?;
        for job in members {
            writeln!(s, "    jobs[\"{}\"]()", quote(job))?;
        }
        writeln!(s, "  }}")?;
        writeln!(s, "}}\n")?;
    }

    writeln!(s, "def steps")?;
    writeln!(s, "node {{")?;
    let mut idx = 0usize;
    for step in &pipeline.steps {
        writeln!(s, "  steps = [:]")?;
        for item in step {
            let unit = match item {
                StepRef::Job(job) => format!("jobs[\"{}\"]", quote(job)),
                StepRef::Sequence(seq) => format!("seqs[\"{}\"]", quote(seq)),
            };
            writeln!(s, "  steps[\"{idx}\"] = {{ {unit}() }}")?;
            idx += 1;
        }
        writeln!(s, "  parallel steps\n")?;
    }
    writeln!(s, "}}\n")?;

    s.write_str(EPILOGUE)?;
    writeln!(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hottest_core::pipeline::JobParams;

    fn model() -> PipelineModel {
        let mut m = PipelineModel::default();
        for job in ["test/X", "test/Y", "test/Z"] {
            m.jobs.insert(job.into(), JobParams::new());
        }
        m.steps = vec![
            vec![StepRef::Job("test/X".into()), StepRef::Job("test/Y".into())],
            vec![StepRef::Job("test/Z".into())],
        ];
        m
    }

    #[test]
    fn steps_run_in_order_with_concurrent_members() {
        let script = pipeline_script(&model()).unwrap();
        let first = script.find("steps[\"0\"] = { jobs[\"test/X\"]() }").unwrap();
        let second = script.find("steps[\"1\"] = { jobs[\"test/Y\"]() }").unwrap();
        let third = script.find("steps[\"2\"] = { jobs[\"test/Z\"]() }").unwrap();
        assert!(first < second && second < third);
        assert_eq!(script.matches("parallel steps").count(), 2);
        let between = &script[second..third];
        assert!(between.contains("parallel steps"), "Z must wait for step 0");
    }

    #[test]
    fn failures_never_propagate() {
        let script = pipeline_script(&model()).unwrap();
        assert!(script.contains("propagate: false"));
        assert!(script.contains("failed[name] ="));
        assert!(script.trim_end().ends_with("println \"${v.key}: ${v.value}\"\n}"));
    }

    #[test]
    fn parametrized_job_lists_string_parameters() {
        let mut m = model();
        m.jobs
            .insert("test/P".into(), JobParams::from([("LOOPS".to_string(), "3".to_string())]));
        let script = pipeline_script(&m).unwrap();
        assert!(script.contains("add_to_jobs(\n  \"test/P\", [\n    string(name: \"LOOPS\", value: \"3\"),\n  ])\n"));
        assert!(script.contains("add_to_jobs (\"test/X\")\n"));
    }

    #[test]
    fn sequences_run_members_serially_in_one_stage() {
        let mut m = model();
        m.sequences
            .insert("flash".into(), vec!["test/X".into(), "test/Y".into()]);
        m.steps = vec![vec![StepRef::Sequence("flash".into())]];
        let script = pipeline_script(&m).unwrap();
        assert!(script.contains(
            "seqs[\"flash\"] = {\n  stage(\"flash\"){\n    jobs[\"test/X\"]()\n    jobs[\"test/Y\"]()\n  }\n}\n"
        ));
        assert!(script.contains("steps[\"0\"] = { seqs[\"flash\"]() }"));
    }

    #[test]
    fn leading_slash_is_rejected() {
        let mut m = model();
        m.jobs.insert("/abs".into(), JobParams::new());
        let err = pipeline_script(&m).unwrap_err();
        assert!(matches!(err, RenderError::Config(ConfigError::LeadingSlash { .. })));
    }

    struct Rejecting;

    impl Write for Rejecting {
        fn write_str(&mut self, _: &str) -> std::fmt::Result {
            Err(std::fmt::Error)
        }
    }

    #[test]
    fn writer_failure_becomes_format_error() {
        let err: RenderError = write_script(&mut Rejecting, &model()).unwrap_err().into();
        assert!(matches!(err, RenderError::Format(_)));
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(quote(r#"a"b$c\d"#), r#"a\"b\$c\\d"#);
    }
}
