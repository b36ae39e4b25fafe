//! Collaborator interfaces of the import pipeline.
//!
//! These traits abstract the remote document collection, the credential
//! lookup and the local cache so the orchestrator can be exercised without
//! network or storage.

use std::collections::HashSet;

use async_trait::async_trait;
use ppp_dictionaries::{Broker, Exchange, Instrument};

use super::instruments_model::{BrokerProfile, BulkWriteSummary, CacheTarget, UpsertSpec};
use crate::errors::Result;

/// Remote instrument collection.
#[async_trait]
pub trait InstrumentCollectionTrait: Send + Sync {
    /// Unordered bulk upsert. Per-operation failures are reported in the
    /// summary; `Err` means the call as a whole failed.
    async fn bulk_write(&self, operations: &[UpsertSpec]) -> Result<BulkWriteSummary>;

    /// Symbols of stored records under `{exchange, broker}` that carry
    /// `removed: true`. Only the symbol and the flag of each record are read.
    async fn find_removed_symbols(
        &self,
        exchange: Exchange,
        broker: Broker,
    ) -> Result<HashSet<String>>;
}

/// Resolves stored broker profiles.
#[async_trait]
pub trait BrokerProfileLookup: Send + Sync {
    /// Profiles of `broker` that are not removed, most recently updated first.
    async fn list_profiles(&self, broker: Broker) -> Result<Vec<BrokerProfile>>;
}

/// Allocates cache versions. Versions for one target strictly increase.
#[async_trait]
pub trait CacheVersionAllocator: Send + Sync {
    async fn next_version(&self, target: &CacheTarget) -> Result<i64>;
}

/// Local instrument cache, one store per [`CacheTarget`].
#[async_trait]
pub trait InstrumentCacheStore: Send + Sync {
    async fn open(&self, target: &CacheTarget) -> Result<Box<dyn InstrumentCacheHandle>>;
}

/// An open cache store.
///
/// Callers must call [`InstrumentCacheHandle::close`] on every path.
#[async_trait]
pub trait InstrumentCacheHandle: Send + Sync {
    /// Instrument rows currently in the store (the version marker excluded).
    async fn read_instruments(&self) -> Result<Vec<Instrument>>;

    /// Current version marker, `None` for a store never written.
    async fn read_version(&self) -> Result<Option<i64>>;

    /// Writes the version marker and puts every row, in one transaction.
    /// On error nothing from this call is visible.
    async fn write_snapshot(&mut self, version: i64, rows: &[Instrument]) -> Result<()>;

    /// Releases the handle.
    async fn close(self: Box<Self>) -> Result<()>;
}
