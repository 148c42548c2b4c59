//! PDF toolkit binary
//!
//! Entry point for running a single tool from the command line.

use clap::Parser;
use toolkit_cli::Cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout only carries the output path
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting PDF toolkit v{}", env!("CARGO_PKG_VERSION"));

    let summary = toolkit_cli::run(&cli).await?;

    tracing::info!(
        pages = summary.metrics.page_count,
        size = %toolkit_core::format_file_size(summary.metrics.output_size_bytes),
        "{}",
        summary.message
    );
    println!("{}", summary.path.display());

    Ok(())
}
