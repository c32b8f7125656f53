//! CSV export.

use super::{COLUMNS, Result, TableExporter, float};
use crate::error::ExportError;
use crate::models::record::InvoiceRecord;

/// Writes records as comma-separated values.
#[derive(Debug, Clone, Copy)]
pub struct CsvExporter {
    delimiter: u8,
}

impl CsvExporter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Use a different field delimiter, e.g. `b';'` for spreadsheet
    /// locales with a decimal comma.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableExporter for CsvExporter {
    fn render(&self, records: &[InvoiceRecord]) -> Result<Vec<u8>> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(vec![]);

        wtr.write_record(COLUMNS)?;
        for record in records {
            wtr.write_record([
                record.code.clone(),
                record.description.clone(),
                float(record.price).to_string(),
                float(record.quantity).to_string(),
                float(record.amount).to_string(),
                float(record.tax).to_string(),
            ])?;
        }

        wtr.into_inner()
            .map_err(|e| ExportError::from(csv::Error::from(e.into_error())))
    }
}
