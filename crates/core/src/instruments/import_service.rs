//! Instrument import orchestrator.
//!
//! One run sequences `dictionary fetch -> remote bulk upsert -> local cache
//! merge`. Failures before the bulk upsert leave remote and cache untouched.
//! A cache failure after a successful upsert is reported as a failed run;
//! the remote records stay written.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::{debug, error, info, warn};
use ppp_dictionaries::{Broker, DictionaryParams, DictionaryRegistry, Exchange, Instrument};
use uuid::Uuid;

use super::cache_merge::CacheMerger;
use super::import_progress::{ImportProgressPayload, ImportProgressReporter, ImportStage};
use super::instruments_model::{
    cache_target_for, credential_broker_for, BulkWriteSummary, CacheMergeOutcome, CacheTarget,
    DictionaryInfo, ImportRequest, ImportResult, ImportState, UpsertSpec,
};
use super::instruments_traits::{BrokerProfileLookup, InstrumentCollectionTrait};
use crate::errors::{Error, Result};

/// Configuration for import runs.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Maximum number of upserts per bulk write call.
    pub bulk_write_chunk_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            bulk_write_chunk_size: 1000,
        }
    }
}

/// Service trait for running imports.
#[async_trait]
pub trait InstrumentImportServiceTrait: Send + Sync {
    /// Dictionaries that can be imported.
    fn dictionaries(&self) -> Vec<DictionaryInfo>;

    /// Current state of the service. A finished run returns it to `Idle`.
    fn state(&self) -> ImportState;

    /// `Success` or `Failed` of the most recent finished run.
    fn last_outcome(&self) -> Option<ImportState>;

    /// Runs one import. Rejected while another run is in flight.
    async fn run_import(&self, request: ImportRequest) -> Result<ImportResult>;
}

#[derive(Debug, Default)]
struct RunStatus {
    state: ImportState,
    last_outcome: Option<ImportState>,
}

/// Marks the service `Running` for its lifetime.
///
/// Settling passes through the outcome back to `Idle`. A guard dropped
/// without being settled (the run future was cancelled) records `Failed`.
pub(crate) struct RunGuard {
    status: Arc<Mutex<RunStatus>>,
    settled: bool,
}

impl RunGuard {
    fn settle(mut self, outcome: ImportState) {
        finish_run(&self.status, outcome);
        self.settled = true;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if !self.settled {
            finish_run(&self.status, ImportState::Failed);
        }
    }
}

fn finish_run(status: &Mutex<RunStatus>, outcome: ImportState) {
    let mut status = status.lock().unwrap_or_else(|e| e.into_inner());
    status.last_outcome = Some(outcome);
    status.state = ImportState::Idle;
}

/// Orchestrates instrument imports.
///
/// # Example
///
/// ```ignore
/// let merger = CacheMerger::new(cache_store, version_allocator);
/// let service = InstrumentImportService::new(
///     registry, collection, profiles, merger,
///     Arc::new(NoOpImportReporter), ImportConfig::default(),
/// );
/// let result = service.run_import(ImportRequest::new(Dictionary::Binance)).await?;
/// ```
pub struct InstrumentImportService<P: ImportProgressReporter> {
    registry: Arc<DictionaryRegistry>,
    collection: Arc<dyn InstrumentCollectionTrait>,
    profiles: Arc<dyn BrokerProfileLookup>,
    merger: CacheMerger,
    progress_reporter: Arc<P>,
    config: ImportConfig,
    status: Arc<Mutex<RunStatus>>,
}

impl<P: ImportProgressReporter> InstrumentImportService<P> {
    pub fn new(
        registry: Arc<DictionaryRegistry>,
        collection: Arc<dyn InstrumentCollectionTrait>,
        profiles: Arc<dyn BrokerProfileLookup>,
        merger: CacheMerger,
        progress_reporter: Arc<P>,
        config: ImportConfig,
    ) -> Self {
        Self {
            registry,
            collection,
            profiles,
            merger,
            progress_reporter,
            config,
            status: Arc::new(Mutex::new(RunStatus::default())),
        }
    }

    /// Claims the service for one run.
    pub(crate) fn begin(&self) -> Result<RunGuard> {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if status.state == ImportState::Running {
            return Err(Error::Validation(
                "An import is already in progress".to_string(),
            ));
        }
        status.state = ImportState::Running;

        Ok(RunGuard {
            status: Arc::clone(&self.status),
            settled: false,
        })
    }

    fn progress(
        &self,
        run_id: &str,
        request: &ImportRequest,
        stage: ImportStage,
        instruments: usize,
    ) {
        self.progress_reporter.report_progress(
            ImportProgressPayload::new(run_id, request.dictionary, stage)
                .with_instruments(instruments),
        );
    }

    async fn run_internal(&self, run_id: &str, request: &ImportRequest) -> Result<ImportResult> {
        let dictionary = request.dictionary;

        // Step 1: Operator input and credentials
        self.progress(run_id, request, ImportStage::Validating, 0);
        let params = self.resolve_params(request).await?;
        self.registry.validate(dictionary, &params)?;

        // Step 2: Fetch
        self.progress(run_id, request, ImportStage::Fetching, 0);
        let instruments = self.registry.fetch(dictionary, &params).await?;
        info!(
            "[{}] Dictionary '{}' returned {} instruments",
            run_id,
            dictionary,
            instruments.len()
        );

        // Step 3: Remote bulk upsert
        let bulk_write = if instruments.is_empty() {
            info!("[{}] Nothing to upsert, skipping remote bulk write", run_id);
            None
        } else {
            self.progress(run_id, request, ImportStage::Writing, instruments.len());
            Some(self.bulk_upsert(run_id, &instruments).await?)
        };

        // Step 4: Local cache
        let cache = match cache_target_for(dictionary) {
            Some(target) => {
                self.progress(run_id, request, ImportStage::Caching, instruments.len());
                Some(self.refresh_cache(run_id, &target, &instruments).await?)
            }
            None => {
                debug!("[{}] Dictionary '{}' has no cache target", run_id, dictionary);
                None
            }
        };

        Ok(ImportResult {
            run_id: run_id.to_string(),
            dictionary,
            imported: instruments.len(),
            bulk_write,
            cache,
            message: format!("Import completed, instruments imported: {}", instruments.len()),
        })
    }

    async fn resolve_params(&self, request: &ImportRequest) -> Result<DictionaryParams> {
        let mut params = DictionaryParams {
            url: request.dictionary_url.clone(),
            api_token: None,
        };

        if let Some(broker) = credential_broker_for(request.dictionary) {
            let token = self
                .resolve_api_token(broker, request.broker_profile_id.as_deref())
                .await?;
            params.api_token = Some(token);
        }

        Ok(params)
    }

    /// Picks the requested profile, or the most recently updated one.
    async fn resolve_api_token(&self, broker: Broker, profile_id: Option<&str>) -> Result<String> {
        let profiles = self.profiles.list_profiles(broker).await?;

        let profile = match profile_id {
            Some(id) => profiles.iter().find(|p| p.id == id).ok_or_else(|| {
                Error::Validation(format!("Broker profile '{}' not found for {}", id, broker))
            })?,
            None => profiles
                .first()
                .ok_or_else(|| Error::Validation(format!("No broker profile for {}", broker)))?,
        };

        profile
            .api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::Validation(format!("Broker profile '{}' has no API token", profile.id))
            })
    }

    async fn bulk_upsert(
        &self,
        run_id: &str,
        instruments: &[Instrument],
    ) -> Result<BulkWriteSummary> {
        let operations: Vec<UpsertSpec> =
            instruments.iter().map(UpsertSpec::for_instrument).collect();
        let chunk_size = self.config.bulk_write_chunk_size.max(1);

        let mut summary = BulkWriteSummary::default();
        for (n, chunk) in operations.chunks(chunk_size).enumerate() {
            let part = self.collection.bulk_write(chunk).await.map_err(|e| match e {
                Error::BulkWrite(_) => e,
                other => Error::BulkWrite(other.to_string()),
            })?;
            summary.absorb(part, n * chunk_size);
        }

        for issue in &summary.errors {
            let symbol = instruments
                .get(issue.index)
                .map(|i| i.symbol.as_str())
                .unwrap_or("?");
            warn!(
                "[{}] Upsert #{} ('{}') rejected: {}",
                run_id, issue.index, symbol, issue.message
            );
        }

        info!(
            "[{}] Bulk write: {} upserted, {} matched, {} modified, {} rejected",
            run_id,
            summary.upserted,
            summary.matched,
            summary.modified,
            summary.errors.len()
        );
        Ok(summary)
    }

    async fn refresh_cache(
        &self,
        run_id: &str,
        target: &CacheTarget,
        instruments: &[Instrument],
    ) -> Result<CacheMergeOutcome> {
        // Records are stored under their own exchange, which may differ from the target's.
        let mut pairs: Vec<(Exchange, Broker)> = Vec::new();
        for instrument in instruments {
            let pair = (instrument.exchange, instrument.broker);
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        if pairs.is_empty() {
            pairs.push((target.exchange, target.broker));
        }

        let mut remote_removed = HashSet::new();
        for (exchange, broker) in pairs {
            let flagged = self.collection.find_removed_symbols(exchange, broker).await?;
            remote_removed.extend(flagged);
        }

        let outcome = self.merger.merge(target, instruments, &remote_removed).await?;
        info!(
            "[{}] Cache '{}' now at version {} ({} rows, {} removed kept)",
            run_id, target, outcome.version, outcome.rows_written, outcome.removed_preserved
        );
        Ok(outcome)
    }
}

#[async_trait]
impl<P: ImportProgressReporter> InstrumentImportServiceTrait for InstrumentImportService<P> {
    fn dictionaries(&self) -> Vec<DictionaryInfo> {
        self.registry
            .dictionaries()
            .into_iter()
            .map(DictionaryInfo::from)
            .collect()
    }

    fn state(&self) -> ImportState {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).state
    }

    fn last_outcome(&self) -> Option<ImportState> {
        self.status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last_outcome
    }

    async fn run_import(&self, request: ImportRequest) -> Result<ImportResult> {
        let guard = self.begin()?;
        let run_id = Uuid::now_v7().to_string();

        info!("[{}] Starting import of dictionary '{}'", run_id, request.dictionary);
        self.progress_reporter
            .report_import_start(&run_id, request.dictionary);

        let result = self.run_internal(&run_id, &request).await;

        match &result {
            Ok(import_result) => {
                info!("[{}] {}", run_id, import_result.message);
                self.progress_reporter.report_import_complete(import_result);
                guard.settle(ImportState::Success);
            }
            Err(e) => {
                error!("[{}] Import of '{}' failed: {}", run_id, request.dictionary, e);
                self.progress_reporter
                    .report_import_failed(&run_id, request.dictionary, &e.to_string());
                guard.settle(ImportState::Failed);
            }
        }

        result
    }
}
