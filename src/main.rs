use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use gsps_annotator::image_pipeline::{AnnotationPipeline, PipelineConfig};
use gsps_annotator::logger;

use tracing::{error, info};

#[derive(Parser)]
#[command(name = "gsps-annotator")]
#[command(about = "Annotate DICOM images with detector findings as GSPS overlays")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input directory (overrides batch.input_dir)
    #[arg(short, long, value_name = "DIR")]
    input: Option<PathBuf>,

    /// Number of units processed concurrently
    #[arg(short, long)]
    workers: Option<usize>,

    /// Write a per-unit CSV report
    #[arg(long, value_name = "CSV")]
    report: Option<PathBuf>,

    /// Build and keep presentation states without sending them
    #[arg(long)]
    no_send: bool,

    /// Debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("gsps-annotator: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(input) = &cli.input {
        config.batch.input_dir = input.clone();
    }
    if let Some(workers) = cli.workers {
        config.batch.workers = workers;
    }
    if cli.no_send {
        config.archive.enabled = false;
    }
    if cli.debug {
        config.logging.debug_mode = true;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<u8> {
    let config = load_config(cli)?;
    let log_file = logger::init(&config.logging)?;

    info!("Starting gsps-annotator...");
    if let Some(path) = &log_file {
        info!("Logging to {}", path.display());
    }

    let pipeline = AnnotationPipeline::new(config).context("failed to set up pipeline")?;
    info!(
        input = %pipeline.config().batch.input_dir.display(),
        workers = pipeline.config().batch.workers,
        "Pipeline initialized"
    );
    if pipeline.config().archive.enabled {
        info!("Archive: {}", pipeline.config().archive.peer());
    } else {
        info!("Archive transmission disabled");
    }

    let report = pipeline.run().context("failed to read input directory")?;
    for line in report.summary_lines() {
        println!("{}", line);
    }

    if let Some(path) = &cli.report {
        report
            .write_csv_file(path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    if !report.all_succeeded() {
        error!("{} of {} units failed", report.failed_count(), report.len());
    }
    Ok(report.exit_code())
}
