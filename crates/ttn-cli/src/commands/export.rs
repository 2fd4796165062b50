//! Export command - render saved results to CSV or a spreadsheet.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use ttn_core::{ExtractionResult, ResultExporter};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Result JSON files produced by the process command
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (default: timestamped name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,

    /// Add a summary sheet (spreadsheet format only)
    #[arg(long)]
    summary: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ExportFormat {
    /// CSV with Excel-compatible Cyrillic encoding
    Csv,
    /// SpreadsheetML workbook
    Xls,
}

pub async fn run(args: ExportArgs) -> anyhow::Result<()> {
    let mut results = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
        let result: ExtractionResult = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid result file {}: {}", path.display(), e))?;
        results.push(result);
    }

    let exporter = ResultExporter::new();
    let payload = match args.format {
        ExportFormat::Csv => exporter.to_csv(&results)?,
        ExportFormat::Xls => exporter.to_spreadsheet(&results, args.summary)?,
    };

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&payload.filename));
    fs::write(&output_path, &payload.bytes)?;
    println!(
        "{} Exported {} results to {}",
        style("✓").green(),
        results.len(),
        output_path.display()
    );

    Ok(())
}
