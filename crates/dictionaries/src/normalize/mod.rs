//! Normalization shared by all adapters.

pub mod symbol;
mod validator;

pub use validator::{
    InstrumentValidator, NormalizationReport, ValidationIssue, ValidationSeverity, ValidatorConfig,
};
