//! Column layout: which whitespace token of an invoice line feeds which field.
//!
//! Positions are signed. A non-negative index counts from the start of the
//! line, a negative one from the end (`-1` is the last token). The default
//! layout matches lines shaped like
//!
//! ```text
//! reference code quantity description... price tax amount
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A signed token position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnIndex(pub i32);

impl ColumnIndex {
    /// Resolve to a concrete token index for a line of `len` tokens.
    pub fn resolve(self, len: usize) -> Option<usize> {
        let index = self.bound(len)?;
        (index < len).then_some(index)
    }

    /// Resolve as a slice bound, where `len` itself is allowed.
    fn bound(self, len: usize) -> Option<usize> {
        if self.0 >= 0 {
            let index = self.0 as usize;
            (index <= len).then_some(index)
        } else {
            len.checked_sub(self.0.unsigned_abs() as usize)
        }
    }

    fn magnitude(self) -> usize {
        self.0.unsigned_abs() as usize
    }
}

/// Token range holding the free-text description, end exclusive.
/// A missing `end` runs to the end of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionSpan {
    pub start: ColumnIndex,
    #[serde(default)]
    pub end: Option<ColumnIndex>,
}

impl DescriptionSpan {
    /// Resolve to a token range for a line of `len` tokens.
    pub fn resolve(&self, len: usize) -> Option<Range<usize>> {
        let start = self.start.bound(len)?;
        let end = match self.end {
            Some(end) => end.bound(len)?,
            None => len,
        };
        (start <= end).then_some(start..end)
    }
}

/// Field-to-token mapping for invoice lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    /// Lines with fewer tokens are treated as noise.
    pub min_tokens: usize,

    /// Product code.
    pub code: ColumnIndex,

    /// Quantity.
    pub quantity: ColumnIndex,

    /// Description tokens.
    pub description: DescriptionSpan,

    /// Original unit price.
    pub price: ColumnIndex,

    /// Printed tax, parsed to qualify the line then discarded.
    pub tax: ColumnIndex,

    /// Printed amount, parsed to qualify the line then discarded.
    pub amount: ColumnIndex,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            min_tokens: 7,
            code: ColumnIndex(1),
            quantity: ColumnIndex(2),
            description: DescriptionSpan {
                start: ColumnIndex(3),
                end: Some(ColumnIndex(-3)),
            },
            price: ColumnIndex(-3),
            tax: ColumnIndex(-2),
            amount: ColumnIndex(-1),
        }
    }
}

impl ColumnLayout {
    /// Named single-token fields.
    pub fn fields(&self) -> [(&'static str, ColumnIndex); 5] {
        [
            ("code", self.code),
            ("quantity", self.quantity),
            ("price", self.price),
            ("tax", self.tax),
            ("amount", self.amount),
        ]
    }

    /// Check that the layout yields disjoint, resolvable positions for every
    /// line long enough to be accepted.
    ///
    /// Start-anchored and end-anchored positions only move relative to each
    /// other until the line is longer than the sum of their magnitudes, so
    /// checking every length up to that point covers all lines.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.min_tokens == 0 {
            return Err(ParseError::InvalidLayout(
                "min_tokens must be at least 1".to_string(),
            ));
        }

        let reach = self
            .fields()
            .iter()
            .map(|(_, index)| index.magnitude())
            .chain([
                self.description.start.magnitude(),
                self.description.end.map_or(0, ColumnIndex::magnitude),
            ])
            .max()
            .unwrap_or(0);

        for len in self.min_tokens..=self.min_tokens + 2 * reach + 1 {
            self.check_len(len).map_err(ParseError::InvalidLayout)?;
        }
        Ok(())
    }

    fn check_len(&self, len: usize) -> Result<(), String> {
        let span = self.description.resolve(len).ok_or_else(|| {
            format!("description span does not resolve for a {len}-token line")
        })?;

        let mut taken: Vec<(&str, usize)> = Vec::with_capacity(5);
        for (name, index) in self.fields() {
            let position = index.resolve(len).ok_or_else(|| {
                format!("{name} position {} is out of range for a {len}-token line", index.0)
            })?;
            if span.contains(&position) {
                return Err(format!(
                    "{name} overlaps the description for a {len}-token line"
                ));
            }
            if let Some((other, _)) = taken.iter().find(|(_, p)| *p == position) {
                return Err(format!(
                    "{name} and {other} share token {position} for a {len}-token line"
                ));
            }
            taken.push((name, position));
        }
        Ok(())
    }
}
