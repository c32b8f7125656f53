//! Price recomputation.

use rust_decimal::Decimal;

use crate::error::ParseError;
use crate::models::record::{Divisor, ITBIS_RATE};

/// Recomputed monetary fields for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priced {
    pub price: Decimal,
    pub amount: Decimal,
    pub tax: Decimal,
}

/// Divisor and tax rate applied to every accepted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    divisor: Divisor,
    tax_rate: Decimal,
}

impl Pricing {
    /// Pricing with the ITBIS rate.
    pub fn new(divisor: Divisor) -> Self {
        Self {
            divisor,
            tax_rate: ITBIS_RATE,
        }
    }

    /// Override the tax rate, which must lie in `[0, 1]`.
    pub fn with_tax_rate(mut self, tax_rate: Decimal) -> Result<Self, ParseError> {
        check_tax_rate(tax_rate)?;
        self.tax_rate = tax_rate;
        Ok(self)
    }

    pub fn divisor(&self) -> Divisor {
        self.divisor
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// `price / divisor`, then `amount = price * quantity`, then
    /// `tax = amount * rate`. Returns the name of the first field that
    /// overflows.
    pub fn apply(&self, price: Decimal, quantity: Decimal) -> Result<Priced, &'static str> {
        let price = price.checked_div(self.divisor.value()).ok_or("price")?;
        let amount = price.checked_mul(quantity).ok_or("amount")?;
        let tax = amount.checked_mul(self.tax_rate).ok_or("tax")?;
        Ok(Priced { price, amount, tax })
    }
}

pub(crate) fn check_tax_rate(tax_rate: Decimal) -> Result<(), ParseError> {
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE {
        return Err(ParseError::InvalidTaxRate(tax_rate));
    }
    Ok(())
}

impl Default for Pricing {
    fn default() -> Self {
        Self::new(Divisor::default())
    }
}
