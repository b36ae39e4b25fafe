//! Import progress reported as log lines.

use ppp_core::instruments::{ImportProgressPayload, ImportProgressReporter, ImportResult};
use ppp_dictionaries::Dictionary;

#[derive(Debug, Clone, Default)]
pub struct TracingImportReporter;

impl ImportProgressReporter for TracingImportReporter {
    fn report_import_start(&self, run_id: &str, dictionary: Dictionary) {
        tracing::info!(run_id, %dictionary, "import started");
    }

    fn report_progress(&self, payload: ImportProgressPayload) {
        tracing::info!(
            run_id = %payload.run_id,
            dictionary = %payload.dictionary,
            stage = %payload.stage,
            instruments = payload.instruments,
            message = payload.message.as_deref().unwrap_or(""),
            "import progress"
        );
    }

    fn report_import_complete(&self, result: &ImportResult) {
        tracing::info!(
            run_id = %result.run_id,
            dictionary = %result.dictionary,
            imported = result.imported,
            cache_version = result.cache.map(|c| c.version),
            "{}",
            result.message
        );
    }

    fn report_import_failed(&self, run_id: &str, dictionary: Dictionary, error: &str) {
        tracing::error!(run_id, %dictionary, error, "import failed");
    }
}
