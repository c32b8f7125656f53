//! Line parser turning extracted invoice text into priced records.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::ParseError;
use crate::models::layout::{ColumnIndex, ColumnLayout};
use crate::models::record::{Divisor, ITBIS_RATE, InvoiceRecord};

use super::pricing::Pricing;

/// Why a line produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Line has no tokens at all.
    Blank,
    /// Line is shorter than the layout requires.
    TooFewTokens { found: usize, required: usize },
    /// A numeric column did not hold a number.
    InvalidNumber { field: &'static str, token: String },
    /// A number, read or recomputed, exceeds the decimal range.
    Overflow { field: &'static str },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Blank => write!(f, "blank line"),
            SkipReason::TooFewTokens { found, required } => {
                write!(f, "{} tokens, at least {} required", found, required)
            }
            SkipReason::InvalidNumber { field, token } => {
                write!(f, "{} is not a number: {:?}", field, token)
            }
            SkipReason::Overflow { field } => write!(f, "{} is out of range", field),
        }
    }
}

/// A line that was dropped, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub reason: SkipReason,
}

/// Accepted records plus an audit trail of dropped lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Records in source line order.
    pub records: Vec<InvoiceRecord>,
    /// Dropped lines in source line order.
    pub skipped: Vec<SkippedLine>,
}

impl ParseOutcome {
    /// True when no line produced a record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Skipped lines that looked like data: long enough but unusable.
    pub fn rejected(&self) -> impl Iterator<Item = &SkippedLine> {
        self.skipped.iter().filter(|s| {
            matches!(
                s.reason,
                SkipReason::InvalidNumber { .. } | SkipReason::Overflow { .. }
            )
        })
    }
}

/// Layout-driven invoice line parser.
#[derive(Debug, Clone)]
pub struct LineParser {
    layout: ColumnLayout,
    tax_rate: Decimal,
}

impl LineParser {
    /// Create a parser for the given layout, validating it first.
    pub fn new(layout: ColumnLayout) -> Result<Self, ParseError> {
        layout.validate()?;
        Ok(Self {
            layout,
            tax_rate: ITBIS_RATE,
        })
    }

    /// Set the tax rate applied to recomputed amounts.
    pub fn with_tax_rate(mut self, tax_rate: Decimal) -> Result<Self, ParseError> {
        super::pricing::check_tax_rate(tax_rate)?;
        self.tax_rate = tax_rate;
        Ok(self)
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Parse `text` with the given divisor.
    ///
    /// Fails only when the divisor is not strictly positive; every per-line
    /// problem ends up in [`ParseOutcome::skipped`].
    pub fn parse(&self, text: &str, divisor: Decimal) -> Result<ParseOutcome, ParseError> {
        let pricing = Pricing::new(Divisor::new(divisor)?).with_tax_rate(self.tax_rate)?;
        Ok(self.parse_with(text, &pricing))
    }

    /// Parse `text` with already validated pricing.
    pub fn parse_with(&self, text: &str, pricing: &Pricing) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            match self.parse_line(line, pricing) {
                Ok(record) => outcome.records.push(record),
                Err(reason) => {
                    if !matches!(reason, SkipReason::Blank) {
                        debug!("Skipping line {}: {}", line_number, reason);
                    }
                    outcome.skipped.push(SkippedLine {
                        line_number,
                        reason,
                    });
                }
            }
        }

        info!(
            "Parsed {} records, skipped {} lines (divisor {})",
            outcome.records.len(),
            outcome.skipped.len(),
            pricing.divisor()
        );

        outcome
    }

    fn parse_line(&self, line: &str, pricing: &Pricing) -> Result<InvoiceRecord, SkipReason> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let layout = &self.layout;

        if tokens.is_empty() {
            return Err(SkipReason::Blank);
        }
        if tokens.len() < layout.min_tokens {
            return Err(SkipReason::TooFewTokens {
                found: tokens.len(),
                required: layout.min_tokens,
            });
        }

        // The validated layout resolves for every line of at least
        // `min_tokens` tokens.
        let token = |index: ColumnIndex| {
            index.resolve(tokens.len()).map(|i| tokens[i]).unwrap_or_default()
        };
        let span = layout.description.resolve(tokens.len()).unwrap_or(0..0);

        let quantity = number("quantity", token(layout.quantity))?;
        let price = number("price", token(layout.price))?;
        number("tax", token(layout.tax))?;
        number("amount", token(layout.amount))?;

        let priced = pricing
            .apply(price, quantity)
            .map_err(|field| SkipReason::Overflow { field })?;

        Ok(InvoiceRecord {
            code: token(layout.code).to_string(),
            description: tokens[span].join(" "),
            price: priced.price,
            quantity,
            amount: priced.amount,
            tax: priced.tax,
        })
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self {
            layout: ColumnLayout::default(),
            tax_rate: ITBIS_RATE,
        }
    }
}

/// Parse `text` with the default layout and ITBIS rate.
pub fn parse(text: &str, divisor: Decimal) -> Result<ParseOutcome, ParseError> {
    LineParser::default().parse(text, divisor)
}

fn number(field: &'static str, token: &str) -> Result<Decimal, SkipReason> {
    if let Some(value) = parse_number(token) {
        return Ok(value);
    }

    // Well-formed but beyond what a Decimal holds, e.g. `1e30`
    let in_float_range = token
        .replace(',', "")
        .parse::<f64>()
        .is_ok_and(f64::is_finite);
    if in_float_range {
        Err(SkipReason::Overflow { field })
    } else {
        Err(SkipReason::InvalidNumber {
            field,
            token: token.to_string(),
        })
    }
}

/// Parse a numeric token, ignoring `,` thousands separators.
pub fn parse_number(token: &str) -> Option<Decimal> {
    let cleaned = token.replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}
