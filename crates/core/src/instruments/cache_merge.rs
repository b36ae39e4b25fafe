//! Local cache refresh.
//!
//! A merge rewrites the whole instrument set of one store under a freshly
//! allocated version. The sticky `removed` flag is carried over by symbol
//! from the rows already in the store and from the flags recovered from the
//! remote collection.

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, warn};
use ppp_dictionaries::Instrument;

use super::instruments_model::{CacheMergeOutcome, CacheTarget};
use super::instruments_traits::{CacheVersionAllocator, InstrumentCacheHandle, InstrumentCacheStore};
use crate::errors::{Error, Result};

/// Symbols flagged removed in `instruments`.
pub fn removed_symbols<'a>(
    instruments: impl IntoIterator<Item = &'a Instrument>,
) -> HashSet<String> {
    instruments
        .into_iter()
        .filter(|i| i.is_removed())
        .map(|i| i.symbol.clone())
        .collect()
}

/// Copies `instruments`, marking every symbol in `removed` as removed.
///
/// Returns the rows and the number of flags carried over.
pub fn transplant_removed(
    instruments: &[Instrument],
    removed: &HashSet<String>,
) -> (Vec<Instrument>, usize) {
    let mut preserved = 0;
    let rows = instruments
        .iter()
        .map(|instrument| {
            let mut row = instrument.clone();
            if removed.contains(&row.symbol) {
                row.removed = Some(true);
                preserved += 1;
            }
            row
        })
        .collect();
    (rows, preserved)
}

/// Refreshes local cache stores.
pub struct CacheMerger {
    store: Arc<dyn InstrumentCacheStore>,
    allocator: Arc<dyn CacheVersionAllocator>,
}

impl CacheMerger {
    pub fn new(
        store: Arc<dyn InstrumentCacheStore>,
        allocator: Arc<dyn CacheVersionAllocator>,
    ) -> Self {
        Self { store, allocator }
    }

    /// Writes `instruments` into the store of `target` under the next version.
    ///
    /// The handle is closed whether the write commits or not.
    pub async fn merge(
        &self,
        target: &CacheTarget,
        instruments: &[Instrument],
        remote_removed: &HashSet<String>,
    ) -> Result<CacheMergeOutcome> {
        let mut handle = self.store.open(target).await?;

        let result = self
            .merge_with(handle.as_mut(), target, instruments, remote_removed)
            .await;

        if let Err(e) = handle.close().await {
            warn!("Failed to release cache store '{}': {}", target, e);
        }

        result
    }

    async fn merge_with(
        &self,
        handle: &mut dyn InstrumentCacheHandle,
        target: &CacheTarget,
        instruments: &[Instrument],
        remote_removed: &HashSet<String>,
    ) -> Result<CacheMergeOutcome> {
        let existing = handle.read_instruments().await?;
        let mut removed = removed_symbols(&existing);
        removed.extend(remote_removed.iter().cloned());
        debug!(
            "Cache '{}': {} existing rows, {} removed symbols",
            target,
            existing.len(),
            removed.len()
        );

        let version = self.allocator.next_version(target).await?;
        let (rows, removed_preserved) = transplant_removed(instruments, &removed);

        handle
            .write_snapshot(version, &rows)
            .await
            .map_err(|e| match e {
                Error::CacheTransaction(_) => e,
                other => Error::CacheTransaction(other.to_string()),
            })?;

        Ok(CacheMergeOutcome {
            version,
            rows_written: rows.len(),
            removed_preserved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppp_dictionaries::{Broker, Exchange, InstrumentType};

    fn stock(symbol: &str) -> Instrument {
        Instrument::new(symbol, Exchange::Us, Broker::Psina, symbol, InstrumentType::Stock)
    }

    #[test]
    fn test_transplant_marks_known_symbols_only() {
        let removed: HashSet<String> = ["TSLA".to_string(), "GONE".to_string()].into();
        let (rows, preserved) = transplant_removed(&[stock("AAPL"), stock("TSLA")], &removed);

        assert_eq!(preserved, 1);
        assert_eq!(rows[0].removed, None);
        assert_eq!(rows[1].removed, Some(true));
    }

    #[test]
    fn test_removed_symbols_ignores_cleared_flags() {
        let mut cleared = stock("AAPL");
        cleared.removed = Some(false);
        let mut flagged = stock("TSLA");
        flagged.removed = Some(true);

        let removed = removed_symbols(&[cleared, flagged, stock("MSFT")]);
        assert_eq!(removed, ["TSLA".to_string()].into());
    }
}
