//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};

use console::style;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use bedu_core::invoice::{ParseOutcome, SkipReason};
use bedu_core::models::config::BeduConfig;
use bedu_core::pdf::{PdfExtractor, PdfProcessor, PdfType};
use bedu_core::{Divisor, ExportFormat, LineParser};

/// Output format selectable on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Excel workbook
    Xlsx,
    /// Comma-separated values
    Csv,
    /// JSON array
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Xlsx => ExportFormat::Xlsx,
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

/// Location of the user configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bedu")
        .join("config.json")
}

/// Load the explicit config file, else the user config, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BeduConfig> {
    if let Some(path) = config_path {
        return Ok(BeduConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using config file {}", path.display());
        Ok(BeduConfig::from_file(&path)?)
    } else {
        Ok(BeduConfig::default())
    }
}

/// Command-line divisor if given, else the configured one, within bounds.
pub fn resolve_divisor(arg: Option<Decimal>, config: &BeduConfig) -> anyhow::Result<Divisor> {
    let value = arg.unwrap_or(config.pricing.divisor);
    Ok(config.pricing.check_divisor(value)?)
}

/// Parser built from the configured layout and tax rate.
pub fn build_parser(config: &BeduConfig) -> anyhow::Result<LineParser> {
    Ok(LineParser::new(config.layout.clone())?.with_tax_rate(config.pricing.tax_rate)?)
}

/// Text read from an input document.
pub struct SourceText {
    pub text: String,
    pub pdf_type: Option<PdfType>,
}

impl SourceText {
    /// A PDF without a usable text layer, most likely a scan.
    pub fn lacks_text_layer(&self) -> bool {
        self.pdf_type.is_some_and(|t| !t.has_text_layer())
    }
}

/// Read the text layer of a PDF, or a plain text file as is.
pub fn read_source(path: &Path, config: &BeduConfig) -> anyhow::Result<SourceText> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            let mut extractor =
                PdfExtractor::new().with_min_text_length(config.pdf.min_text_length);
            extractor.load(&data)?;
            debug!("PDF has {} pages", extractor.page_count());

            let text = extractor.extract_text()?;
            let pdf_type = extractor.classify(&text);
            if !pdf_type.has_text_layer() {
                warn!(
                    "{} has no text layer ({:?}), it may be a scanned document",
                    path.display(),
                    pdf_type
                );
            }

            Ok(SourceText {
                text,
                pdf_type: Some(pdf_type),
            })
        }
        "txt" | "text" => Ok(SourceText {
            text: fs::read_to_string(path)?,
            pdf_type: None,
        }),
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    }
}

/// Print skipped lines that looked like data, or every non-blank skipped
/// line with `all`.
pub fn print_skipped(outcome: &ParseOutcome, all: bool) {
    let lines: Vec<_> = if all {
        outcome
            .skipped
            .iter()
            .filter(|s| s.reason != SkipReason::Blank)
            .collect()
    } else {
        outcome.rejected().collect()
    };

    if lines.is_empty() {
        return;
    }

    eprintln!("{}", style("Skipped lines:").yellow());
    for skipped in lines {
        eprintln!("  line {}: {}", skipped.line_number, skipped.reason);
    }
}
