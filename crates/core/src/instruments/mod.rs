//! Instrument import module.
//!
//! - [`instruments_model`] - Upsert specs, cache targets, run requests and results
//! - [`instruments_traits`] - Collaborator interfaces (remote collection, credential lookup, local cache)
//! - [`cache_merge`] - Versioned cache refresh preserving the sticky `removed` flag
//! - [`import_progress`] - Progress reporting hooks
//! - [`import_service`] - The import orchestrator
//!
//! # Architecture
//!
//! ```text
//! InstrumentImportService → DictionaryRegistry (ppp-dictionaries)
//!       ↓                        ↓
//! InstrumentCollectionTrait   CacheMerger → InstrumentCacheStore + CacheVersionAllocator
//! ```

pub mod cache_merge;
pub mod import_progress;
pub mod import_service;
pub mod instruments_model;
pub mod instruments_traits;


pub use cache_merge::CacheMerger;
pub use import_progress::{
    ImportProgressPayload, ImportProgressReporter, ImportStage, NoOpImportReporter,
};
pub use import_service::{ImportConfig, InstrumentImportService, InstrumentImportServiceTrait};
pub use instruments_model::{
    cache_target_for, credential_broker_for, BrokerProfile, BulkWriteIssue, BulkWriteSummary,
    CacheMergeOutcome, CacheTarget, DictionaryInfo, ImportRequest, ImportResult, ImportState,
    SetClause, UpsertSpec, INSTRUMENTS_COLLECTION, VERSION_MARKER_SYMBOL,
};
pub use instruments_traits::{
    BrokerProfileLookup, CacheVersionAllocator, InstrumentCacheHandle, InstrumentCacheStore,
    InstrumentCollectionTrait,
};
