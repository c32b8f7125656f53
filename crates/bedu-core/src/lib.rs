//! Core library for invoice quotation processing.
//!
//! This crate provides:
//! - PDF text extraction (lopdf + pdf-extract)
//! - Line parsing driven by a configurable column layout
//! - Price recomputation with a caller-supplied divisor and ITBIS
//! - Spreadsheet export (XLSX, CSV, JSON)

pub mod error;
pub mod export;
pub mod invoice;
pub mod models;
pub mod pdf;

pub use error::{BeduError, Result};
pub use export::{
    ExportFormat, TableExporter, destination_for, export_records, export_records_new,
};
pub use invoice::{LineParser, ParseOutcome, Pricing, SkipReason, SkippedLine, parse};
pub use models::config::BeduConfig;
pub use models::layout::{ColumnIndex, ColumnLayout, DescriptionSpan};
pub use models::record::{Divisor, ITBIS_RATE, InvoiceRecord};
pub use pdf::{PdfExtractor, PdfProcessor, PdfType, extract_text};
