//! Table export: serialize invoice records to spreadsheet files.
//!
//! Every format writes the same columns in the same order:
//! `CODIGO, DESCRIPCION, PRECIO, CANTIDAD, IMPORTE, ITBIS`.

mod delimited;
mod json;
mod spreadsheet;

pub use delimited::CsvExporter;
pub use json::JsonExporter;
pub use spreadsheet::XlsxExporter;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::ExportError;
use crate::models::record::InvoiceRecord;

/// Header row, in output order.
pub const COLUMNS: [&str; 6] = ["CODIGO", "DESCRIPCION", "PRECIO", "CANTIDAD", "IMPORTE", "ITBIS"];

/// Numbered variants tried before giving up on a generated name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    /// Exporter writing this format.
    pub fn exporter(&self) -> Box<dyn TableExporter> {
        match self {
            ExportFormat::Xlsx => Box::new(XlsxExporter::new()),
            ExportFormat::Csv => Box::new(CsvExporter::new()),
            ExportFormat::Json => Box::new(JsonExporter::new()),
        }
    }
}

/// Trait for record table writers.
pub trait TableExporter {
    /// Serialize the records, header row first.
    fn render(&self, records: &[InvoiceRecord]) -> Result<Vec<u8>>;

    /// Write the records to `destination`.
    ///
    /// The file is written next to the destination under a temporary name
    /// and renamed into place, so the destination is either the previous
    /// file or the complete new one.
    fn export(&self, records: &[InvoiceRecord], destination: &Path) -> Result<()> {
        let bytes = self.render(records)?;
        write_atomically(destination, &bytes)?;
        info!(
            "Exported {} records to {}",
            records.len(),
            destination.display()
        );
        Ok(())
    }

    /// Write the records to `destination` without replacing anything.
    ///
    /// When the name is taken, `stem_2.ext`, `stem_3.ext` and so on are
    /// tried. Returns the path actually written.
    fn export_new(&self, records: &[InvoiceRecord], destination: &Path) -> Result<PathBuf> {
        let bytes = self.render(records)?;
        let written = write_new(destination, &bytes)?;
        info!("Exported {} records to {}", records.len(), written.display());
        Ok(written)
    }
}

/// Export `records` to `destination` in `format`.
pub fn export_records(
    records: &[InvoiceRecord],
    destination: &Path,
    format: ExportFormat,
) -> Result<()> {
    format.exporter().export(records, destination)
}

/// Export `records` in `format` to `destination` or the first free
/// numbered sibling of it.
pub fn export_records_new(
    records: &[InvoiceRecord],
    destination: &Path,
    format: ExportFormat,
) -> Result<PathBuf> {
    format.exporter().export_new(records, destination)
}

/// Build an output path inside `dir` from a base file name.
///
/// The extension always follows `format`. With a `stamp`, the time is
/// appended to the stem so that separate invocations never share a path.
pub fn destination_for(
    dir: &Path,
    file_name: &str,
    format: ExportFormat,
    stamp: Option<NaiveDateTime>,
) -> PathBuf {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("cotizacion_procesada");

    let name = match stamp {
        Some(stamp) => format!(
            "{}_{}.{}",
            stem,
            stamp.format("%Y%m%d-%H%M%S-%3f"),
            format.extension()
        ),
        None => format!("{}.{}", stem, format.extension()),
    };
    dir.join(name)
}

fn io_error(path: &Path, source: io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Fully written and synced temporary file next to `destination`.
fn stage(destination: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| io_error(destination, e))?;
    file.write_all(bytes).map_err(|e| io_error(destination, e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| io_error(destination, e))?;
    Ok(file)
}

fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    stage(destination, bytes)?
        .persist(destination)
        .map_err(|e| io_error(destination, e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), destination.display());
    Ok(())
}

fn write_new(destination: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let mut file = stage(destination, bytes)?;
    let mut attempt = 1;

    loop {
        let candidate = numbered(destination, attempt);
        match file.persist_noclobber(&candidate) {
            Ok(_) => {
                debug!("Wrote {} bytes to {}", bytes.len(), candidate.display());
                return Ok(candidate);
            }
            Err(e)
                if e.error.kind() == io::ErrorKind::AlreadyExists
                    && attempt < MAX_NAME_ATTEMPTS =>
            {
                debug!("{} exists, trying the next name", candidate.display());
                file = e.file;
                attempt += 1;
            }
            Err(e) => return Err(io_error(&candidate, e.error)),
        }
    }
}

/// `destination` itself for the first attempt, `stem_N.ext` after that.
fn numbered(destination: &Path, attempt: u32) -> PathBuf {
    if attempt <= 1 {
        return destination.to_path_buf();
    }

    let stem = destination
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = match destination.extension().and_then(|e| e.to_str()) {
        Some(extension) => format!("{}_{}.{}", stem, attempt, extension),
        None => format!("{}_{}", stem, attempt),
    };
    destination.with_file_name(name)
}

/// Numeric cells are written as floating point.
fn float(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
