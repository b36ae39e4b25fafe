//! Instrument schema validation.
//!
//! Enforces the canonical record invariants on every adapter's output:
//! - Non-empty symbol
//! - Non-negative price and quantity increments
//! - Board lot of at least one, when present
//! - Upper-cased currency codes
//! - One record per (symbol, exchange, broker)

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{Instrument, InstrumentKey};

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - drop the record.
    Hard,
    /// Soft issue - the record is fixed in place and kept.
    Soft,
}

/// A single problem found on a record.
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
}

/// Validator configuration.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Whether to drop records with negative increments.
    pub reject_negative_increments: bool,
    /// Whether to upper-case currency codes.
    pub uppercase_currency: bool,
    /// Whether to collapse duplicate identity keys to the last record.
    pub collapse_duplicates: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            reject_negative_increments: true,
            uppercase_currency: true,
            collapse_duplicates: true,
        }
    }
}

/// Counts collected while normalizing one batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub accepted: usize,
    pub rejected: usize,
    pub fixed: usize,
    pub duplicates: usize,
}

/// Instrument validator shared by all dictionaries.
pub struct InstrumentValidator {
    config: ValidatorConfig,
}

impl InstrumentValidator {
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Checks one record, applying soft fixes in place.
    pub fn check(&self, instrument: &mut Instrument) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if instrument.symbol.trim().is_empty() {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: "Empty symbol".to_string(),
            });
        }

        if self.config.reject_negative_increments {
            if instrument.min_price_increment < Decimal::ZERO {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!(
                        "Negative price increment: {}",
                        instrument.min_price_increment
                    ),
                });
            }
            if let Some(step) = instrument.min_quantity_increment {
                if step < Decimal::ZERO {
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Hard,
                        message: format!("Negative quantity increment: {}", step),
                    });
                }
            }
        }

        if instrument.lot == Some(0) {
            instrument.lot = None;
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "Zero lot size dropped".to_string(),
            });
        }

        if self.config.uppercase_currency {
            if let Some(currency) = instrument.currency.as_mut() {
                let normalized = currency.trim().to_uppercase();
                if normalized != *currency {
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Soft,
                        message: format!("Currency '{}' normalized to '{}'", currency, normalized),
                    });
                    *currency = normalized;
                }
            }
        }

        if matches!(instrument.isin.as_deref(), Some(isin) if isin.trim().is_empty()) {
            instrument.isin = None;
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "Empty ISIN dropped".to_string(),
            });
        }

        issues
    }

    /// Validates a whole adapter batch.
    ///
    /// Records with hard issues are dropped. When duplicates are collapsed the
    /// last record for a key wins but keeps the position of the first one.
    pub fn normalize_batch(
        &self,
        instruments: Vec<Instrument>,
    ) -> (Vec<Instrument>, NormalizationReport) {
        let mut report = NormalizationReport::default();
        let mut kept: Vec<Instrument> = Vec::with_capacity(instruments.len());
        let mut positions: HashMap<InstrumentKey, usize> = HashMap::new();

        for mut instrument in instruments {
            let issues = self.check(&mut instrument);

            let hard: Vec<&str> = issues
                .iter()
                .filter(|i| i.severity == ValidationSeverity::Hard)
                .map(|i| i.message.as_str())
                .collect();
            if !hard.is_empty() {
                warn!(
                    "Dropping instrument '{}' ({}/{}): {}",
                    instrument.symbol,
                    instrument.exchange,
                    instrument.broker,
                    hard.join("; ")
                );
                report.rejected += 1;
                continue;
            }

            if !issues.is_empty() {
                report.fixed += 1;
                for issue in &issues {
                    warn!("Instrument '{}': {}", instrument.symbol, issue.message);
                }
            }

            if self.config.collapse_duplicates {
                let key = instrument.key();
                if let Some(&at) = positions.get(&key) {
                    warn!(
                        "Duplicate instrument '{}' ({}/{}), keeping the last one",
                        key.symbol, key.exchange, key.broker
                    );
                    report.duplicates += 1;
                    kept[at] = instrument;
                    continue;
                }
                positions.insert(key, kept.len());
            }

            kept.push(instrument);
        }

        report.accepted = kept.len();
        (kept, report)
    }
}

impl Default for InstrumentValidator {
    fn default() -> Self {
        Self::new()
    }
}
