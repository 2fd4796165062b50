//! Batch command - process many documents with bounded concurrency.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use ttn_core::batch::{BatchItem, BatchProcessor};
use ttn_core::{Pipeline, ResultExporter};

use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files glob pattern (e.g. "scans/*.pdf")
    #[arg(required = true)]
    pattern: String,

    /// Summary CSV output path (default: timestamped name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum documents processed in parallel
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Per-document timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Force demo mode (no OCR engine required)
    #[arg(long)]
    demo: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if args.demo {
        config.recognition.force_demo = true;
    }
    if let Some(jobs) = args.jobs {
        config.batch.max_in_flight = jobs;
    }
    if let Some(timeout) = args.timeout {
        config.batch.document_timeout_secs = timeout;
    }

    let paths: Vec<PathBuf> = glob::glob(&args.pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    if paths.is_empty() {
        anyhow::bail!("No files match pattern: {}", args.pattern);
    }

    println!(
        "{} Processing {} documents ({} in parallel)",
        style("→").cyan(),
        paths.len(),
        config.batch.max_in_flight
    );

    let mut items = Vec::with_capacity(paths.len());
    for path in &paths {
        let document_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        match fs::read(path) {
            Ok(data) => items.push(BatchItem {
                document_id,
                data,
                kind: None,
            }),
            Err(e) => warn!("skipping unreadable file {}: {}", path.display(), e),
        }
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message("Running batch...");
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let processor = BatchProcessor::new(Pipeline::new(&config), &config.batch);
    let report = processor.process(items).await;
    pb.finish_and_clear();

    println!(
        "{} {} processed, {} failed",
        style("✓").green(),
        report.processed,
        report.failed
    );
    for outcome in report.outcomes.iter().filter(|o| !o.success) {
        println!(
            "  {} {}: {}",
            style("✗").red(),
            outcome.document_id,
            outcome
                .error_message
                .as_deref()
                .unwrap_or("unknown error")
        );
    }

    let results: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| o.result.clone())
        .collect();
    let payload = ResultExporter::new().to_csv(&results)?;
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&payload.filename));
    fs::write(&output_path, &payload.bytes)?;
    println!(
        "{} Summary written to {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}
