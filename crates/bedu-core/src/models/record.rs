//! Invoice records produced by the line parser.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// ITBIS (Dominican VAT) rate applied to the recomputed amount: 18%.
pub const ITBIS_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

/// A single priced line of the quotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Product code.
    pub code: String,

    /// Product description, tokens joined by single spaces.
    pub description: String,

    /// Unit price after applying the divisor.
    pub price: Decimal,

    /// Quantity as printed on the invoice.
    pub quantity: Decimal,

    /// `price * quantity`.
    pub amount: Decimal,

    /// `amount * tax rate`.
    pub tax: Decimal,
}

/// Price divisor, guaranteed to be strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Divisor(Decimal);

impl Divisor {
    /// Divisor used when none is configured: 0.7.
    pub const DEFAULT: Divisor = Divisor(Decimal::from_parts(7, 0, 0, false, 1));

    /// Validate and wrap a divisor value.
    pub fn new(value: Decimal) -> Result<Self, ParseError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ParseError::InvalidDivisor(value))
        }
    }

    /// The wrapped value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Default for Divisor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<Decimal> for Divisor {
    type Error = ParseError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Divisor> for Decimal {
    fn from(divisor: Divisor) -> Self {
        divisor.0
    }
}

impl fmt::Display for Divisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
