//! Configuration structures for the processing pipeline.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::export::ExportFormat;
use crate::models::layout::ColumnLayout;
use crate::models::record::{Divisor, ITBIS_RATE};

/// Main configuration for the bedu pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeduConfig {
    /// Price recomputation settings.
    pub pricing: PricingConfig,

    /// Invoice line layout.
    pub layout: ColumnLayout,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Output file settings.
    pub output: OutputConfig,
}

/// Price recomputation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Divisor applied to every unit price.
    pub divisor: Decimal,

    /// Smallest accepted divisor.
    pub min_divisor: Decimal,

    /// Largest accepted divisor.
    pub max_divisor: Decimal,

    /// Tax rate applied to the recomputed amount.
    pub tax_rate: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            divisor: Divisor::DEFAULT.value(),
            min_divisor: Decimal::new(1, 1),
            max_divisor: Decimal::new(10, 0),
            tax_rate: ITBIS_RATE,
        }
    }
}

impl PricingConfig {
    /// Check a divisor against the configured bounds.
    pub fn check_divisor(&self, value: Decimal) -> Result<Divisor, ConfigError> {
        let divisor = Divisor::new(value)?;
        if value < self.min_divisor || value > self.max_divisor {
            return Err(ConfigError::Invalid {
                field: "pricing.divisor".to_string(),
                reason: format!(
                    "{} is outside [{}, {}]",
                    value, self.min_divisor, self.max_divisor
                ),
            });
        }
        Ok(divisor)
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum text length to consider a PDF text-based.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { min_text_length: 50 }
    }
}

/// Output file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Base file name; the extension follows the format.
    pub file_name: String,

    /// Output format.
    pub format: ExportFormat,

    /// Append a timestamp so repeated runs never reuse a path.
    pub unique_names: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: "cotizacion_procesada.xlsx".to_string(),
            format: ExportFormat::Xlsx,
            unique_names: true,
        }
    }
}

impl BeduConfig {
    /// Load configuration from a JSON file and validate it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Validate pricing bounds and the column layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pricing = &self.pricing;
        if pricing.min_divisor <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                field: "pricing.min_divisor".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if pricing.min_divisor > pricing.max_divisor {
            return Err(ConfigError::Invalid {
                field: "pricing.max_divisor".to_string(),
                reason: format!("must not be below min_divisor {}", pricing.min_divisor),
            });
        }
        pricing.check_divisor(pricing.divisor)?;

        if pricing.tax_rate < Decimal::ZERO || pricing.tax_rate > Decimal::ONE {
            return Err(crate::error::ParseError::InvalidTaxRate(pricing.tax_rate).into());
        }

        if self.output.file_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "output.file_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        self.layout.validate()?;
        Ok(())
    }
}
