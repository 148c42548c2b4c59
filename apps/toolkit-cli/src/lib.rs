//! Command-line front end for the PDF toolkit
//!
//! Runs one tool over files on disk and writes the result to an output
//! directory. The same pipeline drives the browser build; only file access
//! and export differ.

pub mod fs_export;
pub mod input;

use clap::Parser;
use fs_export::FsExporter;
use std::path::PathBuf;
use toolkit_core::{
    profile, LopdfEngine, PipelineState, ProcessMetrics, ProcessingPipeline, ToolId,
};

#[derive(Parser, Debug)]
#[command(name = "pdf-toolkit")]
#[command(version, about = "Merge, rotate and convert PDFs locally")]
pub struct Cli {
    /// Tool to run: image-to-pdf, merge-pdf or rotate-pdf
    pub tool: String,

    /// Input files, in output order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Rotation in degrees (rotate-pdf only): 90, 180, 270 or 360
    #[arg(short, long, default_value = "90", allow_negative_numbers = true)]
    pub angle: i32,

    /// Directory the result is written to
    #[arg(short, long, default_value = ".", env = "PDF_TOOLKIT_OUT_DIR")]
    pub out_dir: PathBuf,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub path: PathBuf,
    pub message: String,
    pub metrics: ProcessMetrics,
}

/// Run the selected tool end to end
pub async fn run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let tool = ToolId::from_slug(&cli.tool).map_err(|e| {
        let known: Vec<_> = profile::all_profiles().iter().map(|p| p.slug).collect();
        anyhow::anyhow!("{}. Use one of: {}", e, known.join(", "))
    })?;

    let mut pipeline =
        ProcessingPipeline::new(tool, LopdfEngine, FsExporter::new(&cli.out_dir))?;
    pipeline.set_rotation_degrees(cli.angle)?;

    let mut files = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        files.push(input::selected_file(path).await?);
    }
    pipeline.select_files(files)?;

    tracing::info!(
        tool = %tool,
        files = pipeline.files().len(),
        size = %toolkit_core::format_file_size(pipeline.files().total_size()),
        "{}",
        pipeline.profile().process_label(pipeline.files().len())
    );

    let metrics = match pipeline.process().await {
        PipelineState::Succeeded(artifact) => artifact.metrics.clone(),
        PipelineState::Failed(message) => anyhow::bail!("{}", message),
        other => anyhow::bail!("Processing did not complete: {:?}", other.status()),
    };

    pipeline.download()?;
    let path = pipeline
        .exporter()
        .written()
        .last()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No output file was written"))?;

    Ok(RunSummary {
        path,
        message: pipeline.profile().success_message(pipeline.config().rotation),
        metrics,
    })
}
