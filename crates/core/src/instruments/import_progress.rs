//! Progress reporting for import runs.
//!
//! The server logs progress; other front ends can forward it as events.

use ppp_dictionaries::Dictionary;
use serde::{Deserialize, Serialize};

use super::instruments_model::ImportResult;

/// Stage of an import run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportStage {
    /// Resolving credentials and checking input
    Validating,
    /// Calling the dictionary source
    Fetching,
    /// Remote bulk upsert
    Writing,
    /// Local cache refresh
    Caching,
}

impl std::fmt::Display for ImportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportStage::Validating => write!(f, "validating"),
            ImportStage::Fetching => write!(f, "fetching"),
            ImportStage::Writing => write!(f, "writing"),
            ImportStage::Caching => write!(f, "caching"),
        }
    }
}

/// Payload for import progress events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProgressPayload {
    pub run_id: String,
    pub dictionary: Dictionary,
    pub stage: ImportStage,
    /// Instruments known at this stage
    pub instruments: usize,
    pub message: Option<String>,
}

impl ImportProgressPayload {
    pub fn new(run_id: impl Into<String>, dictionary: Dictionary, stage: ImportStage) -> Self {
        Self {
            run_id: run_id.into(),
            dictionary,
            stage,
            instruments: 0,
            message: None,
        }
    }

    pub fn with_instruments(mut self, count: usize) -> Self {
        self.instruments = count;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Trait for reporting import progress.
pub trait ImportProgressReporter: Send + Sync {
    fn report_import_start(&self, run_id: &str, dictionary: Dictionary);

    fn report_progress(&self, payload: ImportProgressPayload);

    fn report_import_complete(&self, result: &ImportResult);

    fn report_import_failed(&self, run_id: &str, dictionary: Dictionary, error: &str);
}

/// A no-op progress reporter for contexts where progress reporting is not needed.
#[derive(Debug, Clone, Default)]
pub struct NoOpImportReporter;

impl ImportProgressReporter for NoOpImportReporter {
    fn report_import_start(&self, _run_id: &str, _dictionary: Dictionary) {}

    fn report_progress(&self, _payload: ImportProgressPayload) {}

    fn report_import_complete(&self, _result: &ImportResult) {}

    fn report_import_failed(&self, _run_id: &str, _dictionary: Dictionary, _error: &str) {}
}
