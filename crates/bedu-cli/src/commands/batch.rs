//! Batch processing command for multiple invoice files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, warn};

use bedu_core::models::config::BeduConfig;
use bedu_core::{Divisor, ExportFormat, LineParser, destination_for, export_records_new};

use super::{OutputFormat, build_parser, load_config, read_source, resolve_divisor};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Output format for each file
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Divisor applied to every unit price
    #[arg(short, long, allow_negative_numbers = true)]
    divisor: Option<Decimal>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome of one input file, one summary row.
#[derive(Debug, Serialize)]
struct FileResult {
    filename: String,
    status: Status,
    records: usize,
    rejected_lines: usize,
    output: String,
    processing_time_ms: u64,
    error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Exported,
    Empty,
    Error,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let divisor = resolve_divisor(args.divisor, &config)?;
    let parser = build_parser(&config)?;
    let format = args
        .format
        .map(ExportFormat::from)
        .unwrap_or(config.output.format);

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&args.output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let labels = output_labels(&files);
    let mut results = Vec::with_capacity(files.len());

    for (path, label) in files.iter().zip(&labels) {
        let file_start = Instant::now();
        let job = Job {
            parser: &parser,
            divisor,
            format,
            output_dir: &args.output_dir,
            config: &config,
        };
        let result = job.run(path, label);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;
        let filename = path.display().to_string();

        match result {
            Ok(Some((destination, records, rejected_lines))) => results.push(FileResult {
                filename,
                status: Status::Exported,
                records,
                rejected_lines,
                output: destination.display().to_string(),
                processing_time_ms,
                error: String::new(),
            }),
            Ok(None) => {
                warn!("No processable invoice lines in {}", path.display());
                results.push(FileResult {
                    filename,
                    status: Status::Empty,
                    records: 0,
                    rejected_lines: 0,
                    output: String::new(),
                    processing_time_ms,
                    error: String::new(),
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        filename,
                        status: Status::Error,
                        records: 0,
                        rejected_lines: 0,
                        output: String::new(),
                        processing_time_ms,
                        error: error_msg,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing {} failed: {}", path.display(), error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    if args.summary {
        let summary_path = args.output_dir.join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let count = |status: Status| results.iter().filter(|r| r.status == status).count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} exported, {} empty, {} failed",
        style(count(Status::Exported)).green(),
        style(count(Status::Empty)).yellow(),
        style(count(Status::Error)).red()
    );

    let failed: Vec<_> = results.iter().filter(|r| r.status == Status::Error).collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in failed {
            println!("  - {}: {}", result.filename, result.error);
        }
    }

    Ok(())
}

/// Settings shared by every file of a batch.
struct Job<'a> {
    parser: &'a LineParser,
    divisor: Divisor,
    format: ExportFormat,
    output_dir: &'a Path,
    config: &'a BeduConfig,
}

impl Job<'_> {
    /// Returns the destination, record count and rejected line count, or
    /// `None` when the file held no processable lines.
    fn run(&self, path: &Path, label: &str) -> anyhow::Result<Option<(PathBuf, usize, usize)>> {
        let source = read_source(path, self.config)?;
        let outcome = self.parser.parse(&source.text, self.divisor.value())?;

        if outcome.is_empty() {
            return Ok(None);
        }

        let stamp = self
            .config
            .output
            .unique_names
            .then(|| Local::now().naive_local());
        let destination = destination_for(
            self.output_dir,
            &format!("{}_{}", label, self.config.output.file_name),
            self.format,
            stamp,
        );

        // Never replaces an earlier output, even with equal names
        let destination = export_records_new(&outcome.records, &destination, self.format)?;
        debug!("Wrote output to {}", destination.display());

        Ok(Some((
            destination,
            outcome.records.len(),
            outcome.rejected().count(),
        )))
    }
}

fn file_stem(path: &Path) -> &str {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice")
}

/// Output name prefix per input: the file stem, or `parent_stem` when
/// several inputs share a stem.
fn output_labels(files: &[PathBuf]) -> Vec<String> {
    let mut stems: HashMap<&str, usize> = HashMap::new();
    for path in files {
        *stems.entry(file_stem(path)).or_default() += 1;
    }

    files
        .iter()
        .map(|path| {
            let stem = file_stem(path);
            let parent = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str());
            match parent {
                Some(parent) if stems[stem] > 1 => format!("{}_{}", parent, stem),
                _ => stem.to_string(),
            }
        })
        .collect()
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}
