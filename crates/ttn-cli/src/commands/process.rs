//! Process command - extract data from a single document file.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use ttn_core::batch::{BatchItem, process_with_timeout};
use ttn_core::{ExtractionResult, FieldName, Pipeline, ResultExporter};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Force demo mode (no OCR engine required)
    #[arg(long)]
    demo: bool,

    /// Show per-field confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if args.demo {
        config.recognition.force_demo = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.set_message(format!("Processing {}", args.input.display()));

    let data = fs::read(&args.input)?;
    let document_id = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();

    // Same wall-clock budget as batch workers.
    let pipeline = Arc::new(Pipeline::new(&config));
    let outcome = process_with_timeout(
        pipeline,
        BatchItem {
            document_id,
            data,
            kind: None,
        },
        config.batch.document_timeout_secs,
    )
    .await;
    pb.finish_and_clear();

    let result = match outcome.result {
        Some(result) => result,
        None => anyhow::bail!(
            "Processing failed: {}",
            outcome.error_message.unwrap_or_else(|| "unknown error".to_string())
        ),
    };

    let output = format_result(&result, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        print_confidence(&result);
    }

    Ok(())
}

fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => {
            let payload = ResultExporter::new().to_csv(std::slice::from_ref(result))?;
            Ok(String::from_utf8(payload.bytes)?)
        }
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_text(result: &ExtractionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Документ: {}\n", result.document_id));
    for name in FieldName::ALL {
        if let Some(value) = result.field_value(name) {
            out.push_str(&format!("{}: {}\n", name.label_ru(), value));
        }
    }
    out.push_str(&format!(
        "Уверенность: {:.1}% ({})\n",
        result.overall_confidence,
        result.quality_tier.label_ru()
    ));
    out.push_str(&format!(
        "Статус: {}{}\n",
        result.validation_status.label_ru(),
        if result.requires_manual_check {
            ", требует ручной проверки"
        } else {
            ""
        }
    ));
    if result.degraded {
        out.push_str("Внимание: демо-режим, OCR-движок недоступен\n");
    }
    out
}

fn print_confidence(result: &ExtractionResult) {
    eprintln!("{}", style("Field confidence:").cyan());
    for field in result.fields.values() {
        let mark = if field.valid {
            style("✓").green()
        } else {
            style("✗").red()
        };
        eprintln!("  {} {}: {:.1}%", mark, field.name, field.confidence);
    }
}
