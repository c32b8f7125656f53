//! JSON export, one object per row keyed by column name.

use serde::Serialize;

use super::{Result, TableExporter, float};
use crate::models::record::InvoiceRecord;

#[derive(Serialize)]
struct Row<'a> {
    #[serde(rename = "CODIGO")]
    code: &'a str,
    #[serde(rename = "DESCRIPCION")]
    description: &'a str,
    #[serde(rename = "PRECIO")]
    price: f64,
    #[serde(rename = "CANTIDAD")]
    quantity: f64,
    #[serde(rename = "IMPORTE")]
    amount: f64,
    #[serde(rename = "ITBIS")]
    tax: f64,
}

impl<'a> From<&'a InvoiceRecord> for Row<'a> {
    fn from(record: &'a InvoiceRecord) -> Self {
        Self {
            code: &record.code,
            description: &record.description,
            price: float(record.price),
            quantity: float(record.quantity),
            amount: float(record.amount),
            tax: float(record.tax),
        }
    }
}

/// Writes records as a pretty-printed JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl JsonExporter {
    pub fn new() -> Self {
        Self
    }
}

impl TableExporter for JsonExporter {
    fn render(&self, records: &[InvoiceRecord]) -> Result<Vec<u8>> {
        let rows: Vec<Row<'_>> = records.iter().map(Row::from).collect();
        Ok(serde_json::to_vec_pretty(&rows)?)
    }
}
