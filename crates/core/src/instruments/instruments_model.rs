//! Import run domain models.

use std::fmt;

use chrono::{DateTime, Utc};
use ppp_dictionaries::{Broker, Dictionary, Exchange, Instrument, InstrumentKey};
use serde::{Deserialize, Serialize};

/// Reserved row key holding the cache version of a store.
pub const VERSION_MARKER_SYMBOL: &str = "@version";

/// Remote collection the instruments are upserted into.
pub const INSTRUMENTS_COLLECTION: &str = "instruments";

/// Local cache store of one `(exchange, broker)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheTarget {
    pub exchange: Exchange,
    pub broker: Broker,
}

impl CacheTarget {
    pub fn new(exchange: Exchange, broker: Broker) -> Self {
        Self { exchange, broker }
    }

    /// Store name, `"<exchange>:<broker>"`.
    pub fn store_name(&self) -> String {
        format!("{}:{}", self.exchange, self.broker)
    }
}

impl fmt::Display for CacheTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.broker)
    }
}

/// Cache store refreshed by an import of `dictionary`, if any.
pub fn cache_target_for(dictionary: Dictionary) -> Option<CacheTarget> {
    let (exchange, broker) = match dictionary {
        Dictionary::Binance => (Exchange::Binance, Broker::Binance),
        Dictionary::UtexMarginStocks => (Exchange::UtexMarginStocks, Broker::Utex),
        Dictionary::PsinaUsStocks => (Exchange::Us, Broker::Psina),
        Dictionary::AlorSpbx => (Exchange::Spbx, Broker::Alor),
        Dictionary::Tinkoff => (Exchange::Rus, Broker::Tinkoff),
    };
    Some(CacheTarget::new(exchange, broker))
}

/// Broker whose stored profile supplies the API token for `dictionary`.
pub fn credential_broker_for(dictionary: Dictionary) -> Option<Broker> {
    match dictionary {
        Dictionary::Tinkoff => Some(Broker::Tinkoff),
        _ => None,
    }
}

// =============================================================================
// Remote upsert
// =============================================================================

/// `$set` update document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetClause {
    #[serde(rename = "$set")]
    pub set: Instrument,
}

/// One keyed upsert against the remote collection.
///
/// The record is written with `$set`, so fields absent from it (notably
/// `removed`) keep their stored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertSpec {
    pub filter: InstrumentKey,
    pub update: SetClause,
    pub upsert: bool,
}

impl UpsertSpec {
    pub fn for_instrument(instrument: &Instrument) -> Self {
        Self {
            filter: instrument.key(),
            update: SetClause {
                set: instrument.clone(),
            },
            upsert: true,
        }
    }
}

/// A single rejected operation of an unordered bulk write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWriteIssue {
    /// Index of the operation in the submitted batch.
    pub index: usize,
    pub message: String,
}

/// Outcome of an unordered bulk write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWriteSummary {
    pub matched: u64,
    pub modified: u64,
    pub upserted: u64,
    #[serde(default)]
    pub errors: Vec<BulkWriteIssue>,
}

impl BulkWriteSummary {
    /// Folds a chunk summary into this one, shifting issue indices by `offset`.
    pub fn absorb(&mut self, chunk: BulkWriteSummary, offset: usize) {
        self.matched += chunk.matched;
        self.modified += chunk.modified;
        self.upserted += chunk.upserted;
        self.errors.extend(chunk.errors.into_iter().map(|issue| BulkWriteIssue {
            index: issue.index + offset,
            message: issue.message,
        }));
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Stored broker profile as returned by the credential lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerProfile {
    pub id: String,
    pub broker: Broker,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Import run
// =============================================================================

/// Operator request for one import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub dictionary: Dictionary,
    #[serde(default)]
    pub dictionary_url: Option<String>,
    #[serde(default)]
    pub broker_profile_id: Option<String>,
}

impl ImportRequest {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            dictionary,
            dictionary_url: None,
            broker_profile_id: None,
        }
    }
}

/// State of the import service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportState {
    #[default]
    Idle,
    Running,
    Success,
    Failed,
}

/// Result of the local cache step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMergeOutcome {
    pub version: i64,
    pub rows_written: usize,
    pub removed_preserved: usize,
}

/// Successful import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub run_id: String,
    pub dictionary: Dictionary,
    pub imported: usize,
    /// `None` when the list was empty and the remote call was skipped.
    pub bulk_write: Option<BulkWriteSummary>,
    /// `None` when the dictionary has no cache target.
    pub cache: Option<CacheMergeOutcome>,
    pub message: String,
}

/// Dictionary entry as presented to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryInfo {
    pub id: Dictionary,
    pub name: String,
    pub requires_url: bool,
    pub requires_credential: bool,
    pub cache_target: Option<CacheTarget>,
}

impl From<Dictionary> for DictionaryInfo {
    fn from(dictionary: Dictionary) -> Self {
        Self {
            id: dictionary,
            name: dictionary.display_name().to_string(),
            requires_url: dictionary.requires_url(),
            requires_credential: dictionary.requires_credential(),
            cache_target: cache_target_for(dictionary),
        }
    }
}
