//! `hottest gen`: build one artifact and print it on stdout.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand, ValueEnum};

use hottest_core::{agent, job, pipeline, ConfigError, FolderModel, JobSpec};
use hottest_renderer::{pipeline_script, Renderer};

/// What to print for the generated item.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Output {
    /// The executable script.
    Script,
    /// The server configuration document.
    #[default]
    Xml,
    /// The model as a fixed-width field listing.
    Metadata,
}

#[derive(Args, Debug)]
pub struct ChunkArgs {
    /// Adds a chunk include directory. Repeatable.
    #[arg(short = 'c', long = "chunk-include", required = true)]
    pub chunk_include: Vec<PathBuf>,

    /// Board chunk, without the .json/.sh extension.
    #[arg(short = 'b', long)]
    pub board_chunk: String,

    /// Adds a parametrization file. Repeatable; applied in order.
    #[arg(short = 'p', long = "param-file")]
    pub param_file: Vec<PathBuf>,

    #[arg(short = 'o', long, value_enum, default_value_t = Output::Xml)]
    pub output: Output,
}

impl ChunkArgs {
    fn search_dirs(&self) -> Result<Vec<PathBuf>> {
        for dir in &self.chunk_include {
            if !dir.is_dir() {
                return Err(ConfigError::NotADirectory { path: dir.clone() })
                    .context("bad chunk include dir");
            }
        }
        Ok(self.chunk_include.clone())
    }
}

#[derive(Args, Debug)]
pub struct JobArgs {
    #[command(flatten)]
    pub chunks: ChunkArgs,

    /// Test chunk, without the .json/.sh extension.
    #[arg(short = 't', long)]
    pub test_chunk: String,

    /// Adds a label to the job's node expression. Repeatable.
    #[arg(short = 'l', long = "extra-label")]
    pub extra_label: Vec<String>,
}

#[derive(Args, Debug)]
pub struct NodeArgs {
    #[command(flatten)]
    pub chunks: ChunkArgs,

    /// Jenkins node name.
    #[arg(short = 'n', long)]
    pub node_name: String,
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Pipeline definition file.
    #[arg(short = 'f', long)]
    pub pipeline_file: PathBuf,

    /// Folder every job referenced by the pipeline is placed under.
    #[arg(long, default_value = "")]
    pub root_folder: String,

    #[arg(short = 'o', long, value_enum, default_value_t = Output::Xml)]
    pub output: Output,
}

#[derive(Subcommand, Debug)]
pub enum GenCommand {
    /// A freestyle job assembled from a board and a test chunk.
    Job(JobArgs),
    /// A build agent.
    Node(NodeArgs),
    /// A pipeline triggering other jobs.
    Pipeline(PipelineArgs),
    /// The folder document used for auto-created folders.
    Folder,
}

pub fn run(command: GenCommand) -> Result<()> {
    let text = render(command)?;
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// The text `gen` prints, without printing it.
pub fn render(command: GenCommand) -> Result<String> {
    let renderer = Renderer::new().context("failed to load templates")?;
    match command {
        GenCommand::Job(args) => {
            let spec = JobSpec {
                search_dirs: args.chunks.search_dirs()?,
                agent_chunk: args.chunks.board_chunk.clone(),
                job_chunk: args.test_chunk.clone(),
                extra_labels: args.extra_label.clone(),
                overlay_files: args.chunks.param_file.clone(),
            };
            let model = job::build(&spec)
                .with_context(|| format!("failed to build job from \"{}\"", args.test_chunk))?;
            Ok(match args.chunks.output {
                Output::Script => model.script.clone(),
                Output::Xml => renderer.render_job(&model)?,
                Output::Metadata => model.to_string(),
            })
        }
        GenCommand::Node(args) => {
            let dirs = args.chunks.search_dirs()?;
            let model = agent::build(
                &args.node_name,
                &dirs,
                &args.chunks.board_chunk,
                &args.chunks.param_file,
            )
            .with_context(|| format!("failed to build node \"{}\"", args.node_name))?;
            match args.chunks.output {
                Output::Script => bail!("nodes have no script; use --output xml or --output metadata"),
                Output::Xml => Ok(renderer.render_agent(&model)?),
                Output::Metadata => Ok(model.to_string()),
            }
        }
        GenCommand::Pipeline(args) => {
            let model = pipeline::build(&args.pipeline_file, &args.root_folder).with_context(|| {
                format!("failed to build pipeline from {}", args.pipeline_file.display())
            })?;
            Ok(match args.output {
                Output::Script => pipeline_script(&model)?,
                Output::Xml => renderer.render_pipeline(&model)?,
                Output::Metadata => model.to_string(),
            })
        }
        GenCommand::Folder => Ok(renderer.render_folder(&FolderModel)?),
    }
}
