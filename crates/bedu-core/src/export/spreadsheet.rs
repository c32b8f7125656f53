//! XLSX export using rust_xlsxwriter.

use rust_xlsxwriter::{Format, Workbook};

use super::{COLUMNS, Result, TableExporter, float};
use crate::models::record::InvoiceRecord;

/// Default worksheet name.
const SHEET_NAME: &str = "Cotizacion";

/// Writes records to a single-sheet XLSX workbook.
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    sheet_name: String,
}

impl XlsxExporter {
    pub fn new() -> Self {
        Self {
            sheet_name: SHEET_NAME.to_string(),
        }
    }

    /// Set the worksheet name.
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl TableExporter for XlsxExporter {
    fn render(&self, records: &[InvoiceRecord]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;

        for (col, title) in COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *title, &header)?;
        }

        for (index, record) in records.iter().enumerate() {
            let row = index as u32 + 1;
            worksheet.write_string(row, 0, &record.code)?;
            worksheet.write_string(row, 1, &record.description)?;
            worksheet.write_number(row, 2, float(record.price))?;
            worksheet.write_number(row, 3, float(record.quantity))?;
            worksheet.write_number(row, 4, float(record.amount))?;
            worksheet.write_number(row, 5, float(record.tax))?;
        }
        worksheet.set_column_width(1, 40)?;

        Ok(workbook.save_to_buffer()?)
    }
}
