use anyhow::{Context, Result};
use clap::Parser;
use docket_ocr::{DocumentPipeline, OcrAdapter};
use std::io;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.pipeline_config()?;
    tracing::debug!(?config, "Resolved pipeline configuration");

    let ocr = OcrAdapter::init_global(&config.ocr).context("Failed to initialize OCR")?;
    let pipeline = DocumentPipeline::new(ocr, &config).context("Invalid preprocessing config")?;
    let outcome = pipeline
        .run()
        .with_context(|| format!("Batch over {} failed", config.input_dir.display()))?;

    println!("{}", outcome.report.render());
    Ok(())
}
