use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use log::debug;
use std::sync::{Arc, Mutex};

use super::model::{CacheVersionDB, InstrumentCacheRowDB, VersionMarkerDocument};
use crate::db::{get_connection, DbConnection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::instrument_cache_rows::dsl as rows_dsl;
use crate::schema::instrument_cache_versions::dsl as versions_dsl;
use ppp_core::errors::{Error, Result};
use ppp_core::instruments::{
    CacheTarget, CacheVersionAllocator, InstrumentCacheHandle, InstrumentCacheStore,
    VERSION_MARKER_SYMBOL,
};
use ppp_dictionaries::Instrument;

/// SQLite-backed instrument cache.
pub struct InstrumentCacheRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl InstrumentCacheRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        InstrumentCacheRepository { pool, writer }
    }
}

#[async_trait]
impl InstrumentCacheStore for InstrumentCacheRepository {
    async fn open(&self, target: &CacheTarget) -> Result<Box<dyn InstrumentCacheHandle>> {
        let conn = get_connection(&self.pool)?;
        let store = target.store_name();
        debug!("Opened cache store '{}'", store);

        Ok(Box::new(SqliteCacheHandle {
            store,
            conn: Mutex::new(Some(conn)),
            writer: self.writer.clone(),
        }))
    }
}

/// Open store. Holds a pooled read connection until closed.
pub struct SqliteCacheHandle {
    store: String,
    conn: Mutex<Option<DbConnection>>,
    writer: WriteHandle,
}

impl SqliteCacheHandle {
    fn with_conn<T>(&self, f: impl FnOnce(&mut DbConnection) -> Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| Error::Unexpected("Cache connection lock poisoned".to_string()))?;
        let conn = guard
            .as_mut()
            .ok_or_else(|| Error::Unexpected(format!("Cache store '{}' is closed", self.store)))?;
        f(conn)
    }
}

#[async_trait]
impl InstrumentCacheHandle for SqliteCacheHandle {
    async fn read_instruments(&self) -> Result<Vec<Instrument>> {
        let documents: Vec<String> = self.with_conn(|conn| {
            rows_dsl::instrument_cache_rows
                .filter(rows_dsl::store.eq(&self.store))
                .filter(rows_dsl::symbol.ne(VERSION_MARKER_SYMBOL))
                .select(rows_dsl::document)
                .load::<String>(conn)
                .into_core()
        })?;

        documents
            .iter()
            .map(|d| {
                serde_json::from_str::<Instrument>(d).map_err(|e| StorageError::from(e).into())
            })
            .collect()
    }

    async fn read_version(&self) -> Result<Option<i64>> {
        let document: Option<String> = self.with_conn(|conn| {
            rows_dsl::instrument_cache_rows
                .filter(rows_dsl::store.eq(&self.store))
                .filter(rows_dsl::symbol.eq(VERSION_MARKER_SYMBOL))
                .select(rows_dsl::document)
                .first::<String>(conn)
                .optional()
                .into_core()
        })?;

        document
            .map(|d| serde_json::from_str::<VersionMarkerDocument>(&d).map(|m| m.version))
            .transpose()
            .map_err(|e| StorageError::from(e).into())
    }

    async fn write_snapshot(&mut self, version: i64, rows: &[Instrument]) -> Result<()> {
        self.with_conn(|_| Ok(()))?;

        let now = Utc::now().to_rfc3339();
        let mut records = Vec::with_capacity(rows.len() + 1);
        records.push(InstrumentCacheRowDB::version_marker(&self.store, version, &now)?);
        for row in rows {
            records.push(InstrumentCacheRowDB::from_instrument(&self.store, row, &now)?);
        }

        let written = self
            .writer
            .exec(move |conn| {
                for record in &records {
                    diesel::replace_into(rows_dsl::instrument_cache_rows)
                        .values(record)
                        .execute(conn)
                        .into_core()?;
                }
                Ok(records.len())
            })
            .await
            .map_err(|e| Error::CacheTransaction(format!("store '{}': {}", self.store, e)))?;

        debug!(
            "Cache store '{}' committed version {} ({} rows)",
            self.store,
            version,
            written - 1
        );
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::Unexpected("Cache connection lock poisoned".to_string()))?
            .take();
        drop(conn);
        debug!("Closed cache store '{}'", self.store);
        Ok(())
    }
}

/// Version allocator backed by the `instrument_cache_versions` table.
pub struct CacheVersionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl CacheVersionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        CacheVersionRepository { pool, writer }
    }

    /// Last allocated version of `target`.
    pub fn current_version(&self, target: &CacheTarget) -> Result<Option<i64>> {
        let mut conn = get_connection(&self.pool)?;
        versions_dsl::instrument_cache_versions
            .filter(versions_dsl::store.eq(target.store_name()))
            .select(versions_dsl::version)
            .first::<i64>(&mut conn)
            .optional()
            .into_core()
    }
}

#[async_trait]
impl CacheVersionAllocator for CacheVersionRepository {
    async fn next_version(&self, target: &CacheTarget) -> Result<i64> {
        let store = target.store_name();

        // Read and bump run in the writer's transaction, so allocations serialize.
        self.writer
            .exec(move |conn| {
                let current = versions_dsl::instrument_cache_versions
                    .filter(versions_dsl::store.eq(&store))
                    .select(versions_dsl::version)
                    .first::<i64>(conn)
                    .optional()
                    .into_core()?;
                let next = current.unwrap_or(0) + 1;

                diesel::replace_into(versions_dsl::instrument_cache_versions)
                    .values(&CacheVersionDB {
                        store,
                        version: next,
                        updated_at: Utc::now().to_rfc3339(),
                    })
                    .execute(conn)
                    .into_core()?;

                Ok(next)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use ppp_dictionaries::{Broker, Exchange, InstrumentType};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    struct TestDb {
        _dir: tempfile::TempDir,
        pool: Arc<DbPool>,
        writer: WriteHandle,
    }

    fn setup() -> TestDb {
        let dir = tempdir().unwrap();
        let path = dir.path().join("instruments.db");
        let path = init(path.to_str().unwrap()).unwrap();
        let pool = create_pool(&path).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer(pool.clone());
        TestDb {
            _dir: dir,
            pool,
            writer,
        }
    }

    fn psina() -> CacheTarget {
        CacheTarget::new(Exchange::Us, Broker::Psina)
    }

    fn stock(symbol: &str) -> Instrument {
        Instrument::new(symbol, Exchange::Us, Broker::Psina, symbol, InstrumentType::Stock)
            .with_currency("USD")
            .with_lot(1)
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let db = setup();
        let repo = InstrumentCacheRepository::new(db.pool.clone(), db.writer.clone());

        let mut handle = repo.open(&psina()).await.unwrap();
        assert_eq!(handle.read_version().await.unwrap(), None);

        let mut tsla = stock("TSLA").with_min_price_increment(dec!(0.01));
        tsla.removed = Some(true);
        handle.write_snapshot(1, &[stock("AAPL"), tsla]).await.unwrap();

        let mut rows = handle.read_instruments().await.unwrap();
        rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].symbol, "TSLA");
        assert_eq!(rows[1].min_price_increment, dec!(0.01));
        assert_eq!(rows[1].removed, Some(true));
        assert_eq!(handle.read_version().await.unwrap(), Some(1));

        handle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_rows_are_put_never_deleted() {
        let db = setup();
        let repo = InstrumentCacheRepository::new(db.pool.clone(), db.writer.clone());

        let mut handle = repo.open(&psina()).await.unwrap();
        handle.write_snapshot(1, &[stock("AAPL"), stock("MSFT")]).await.unwrap();
        handle
            .write_snapshot(2, &[stock("MSFT").with_currency("EUR")])
            .await
            .unwrap();

        let rows = handle.read_instruments().await.unwrap();
        assert_eq!(rows.len(), 2);
        let msft = rows.iter().find(|r| r.symbol == "MSFT").unwrap();
        assert_eq!(msft.currency.as_deref(), Some("EUR"));
        assert_eq!(handle.read_version().await.unwrap(), Some(2));
        handle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_snapshot_commits_nothing() {
        let db = setup();
        {
            let mut conn = get_connection(&db.pool).unwrap();
            diesel::sql_query(
                "CREATE TRIGGER reject_boom BEFORE INSERT ON instrument_cache_rows \
                 WHEN NEW.symbol = 'BOOM' BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .execute(&mut conn)
            .unwrap();
        }
        let repo = InstrumentCacheRepository::new(db.pool.clone(), db.writer.clone());

        let mut handle = repo.open(&psina()).await.unwrap();
        let error = handle
            .write_snapshot(1, &[stock("AAPL"), stock("BOOM")])
            .await
            .unwrap_err();

        assert!(matches!(error, Error::CacheTransaction(_)));
        assert!(handle.read_instruments().await.unwrap().is_empty());
        assert_eq!(handle.read_version().await.unwrap(), None);
        handle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let db = setup();
        let repo = InstrumentCacheRepository::new(db.pool.clone(), db.writer.clone());

        let mut handle = repo.open(&psina()).await.unwrap();
        handle.write_snapshot(1, &[stock("AAPL")]).await.unwrap();
        handle.close().await.unwrap();

        let other = repo
            .open(&CacheTarget::new(Exchange::Spbx, Broker::Alor))
            .await
            .unwrap();
        assert!(other.read_instruments().await.unwrap().is_empty());
        assert_eq!(other.read_version().await.unwrap(), None);
        other.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_versions_strictly_increase_per_store() {
        let db = setup();
        let versions = CacheVersionRepository::new(db.pool.clone(), db.writer.clone());
        let alor = CacheTarget::new(Exchange::Spbx, Broker::Alor);

        assert_eq!(versions.current_version(&psina()).unwrap(), None);
        assert_eq!(versions.next_version(&psina()).await.unwrap(), 1);
        assert_eq!(versions.next_version(&psina()).await.unwrap(), 2);
        assert_eq!(versions.next_version(&alor).await.unwrap(), 1);
        assert_eq!(versions.current_version(&psina()).unwrap(), Some(2));
    }
}
