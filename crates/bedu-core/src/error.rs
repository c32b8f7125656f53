//! Error types for the bedu-core library.

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the bedu library.
#[derive(Error, Debug)]
pub enum BeduError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Line parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Table export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors that abort parsing before any line is read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Divisor is zero or negative.
    #[error("divisor must be greater than zero, got {0}")]
    InvalidDivisor(Decimal),

    /// Tax rate outside of [0, 1].
    #[error("tax rate must be between 0 and 1, got {0}")]
    InvalidTaxRate(Decimal),

    /// The column layout is inconsistent.
    #[error("invalid column layout: {0}")]
    InvalidLayout(String),
}

/// Errors raised while writing a record table.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Destination could not be written.
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// XLSX serialization failed.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors in a loaded configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read or written.
    #[error("cannot access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for the expected shape.
    #[error("malformed config: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// Layout or pricing settings rejected by the parser.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Result type for the bedu library.
pub type Result<T> = std::result::Result<T, BeduError>;
