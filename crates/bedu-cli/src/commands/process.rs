//! Process command - reprice a single invoice and export it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, info};

use bedu_core::invoice::ParseOutcome;
use bedu_core::models::config::BeduConfig;
use bedu_core::{ExportFormat, InvoiceRecord, destination_for, export_records, export_records_new};

use super::{OutputFormat, build_parser, load_config, print_skipped, read_source, resolve_divisor};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, or already extracted text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: generated in --output-dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for generated output names
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Output format (default: from --output extension, then config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Divisor applied to every unit price
    #[arg(short, long, allow_negative_numbers = true)]
    divisor: Option<Decimal>,

    /// Print the processed table
    #[arg(long)]
    preview: bool,

    /// List every skipped line, not only rejected data rows
    #[arg(long)]
    show_skipped: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let divisor = resolve_divisor(args.divisor, &config)?;
    let parser = build_parser(&config)?;

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Extracting text...");
    pb.set_position(10);
    let source = read_source(&args.input, &config)?;
    debug!("Source type: {:?}", source.pdf_type);

    pb.set_message("Parsing lines...");
    pb.set_position(50);
    let outcome = parser.parse(&source.text, divisor.value())?;

    if outcome.is_empty() {
        pb.finish_and_clear();
        println!(
            "{} No processable invoice lines found in {}",
            style("⚠").yellow(),
            args.input.display()
        );
        if source.lacks_text_layer() {
            println!(
                "{} The PDF has no text layer; it looks like a scanned document",
                style("ℹ").blue()
            );
        }
        print_skipped(&outcome, args.show_skipped);
        return Ok(());
    }

    let format = resolve_format(args.format, args.output.as_deref(), &config);

    pb.set_message("Exporting...");
    pb.set_position(80);
    let destination = match &args.output {
        // An explicit path is replaced if it exists
        Some(output) => {
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            export_records(&outcome.records, output, format)?;
            output.clone()
        }
        None => {
            fs::create_dir_all(&args.output_dir)?;
            let stamp = config
                .output
                .unique_names
                .then(|| Local::now().naive_local());
            let destination =
                destination_for(&args.output_dir, &config.output.file_name, format, stamp);
            export_records_new(&outcome.records, &destination, format)?
        }
    };
    pb.finish_and_clear();

    if args.preview {
        print!("{}", format_table(&outcome.records));
    }

    println!(
        "{} {} records (divisor {}) written to {}",
        style("✓").green(),
        outcome.records.len(),
        divisor,
        destination.display()
    );
    print_skipped(&outcome, args.show_skipped);
    print_rejected_count(&outcome, args.show_skipped);

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Explicit format, else the output extension, else the configured format.
pub fn resolve_format(
    format: Option<OutputFormat>,
    output: Option<&Path>,
    config: &BeduConfig,
) -> ExportFormat {
    format
        .map(ExportFormat::from)
        .or_else(|| output.and_then(ExportFormat::from_path))
        .unwrap_or(config.output.format)
}

fn print_rejected_count(outcome: &ParseOutcome, shown: bool) {
    let rejected = outcome.rejected().count();
    if rejected > 0 && !shown {
        println!(
            "{} {} data-like lines were rejected (use --show-skipped for details)",
            style("ℹ").blue(),
            rejected
        );
    }
}

/// Render records as an aligned text table, amounts rounded to cents.
pub fn format_table(records: &[InvoiceRecord]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<12} {:<36} {:>14} {:>10} {:>16} {:>14}\n",
        "CODIGO", "DESCRIPCION", "PRECIO", "CANTIDAD", "IMPORTE", "ITBIS"
    ));
    for record in records {
        output.push_str(&format!(
            "{:<12} {:<36} {:>14} {:>10} {:>16} {:>14}\n",
            record.code,
            record.description,
            record.price.round_dp(2),
            record.quantity.normalize(),
            record.amount.round_dp(2),
            record.tax.round_dp(2),
        ));
    }

    output
}
