use std::collections::HashSet;
use std::sync::Arc;

use ppp_core::instruments::{CacheMerger, CacheTarget, InstrumentCacheStore};
use ppp_dictionaries::{Broker, Exchange, Instrument, InstrumentType};
use ppp_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, CacheVersionRepository,
    InstrumentCacheRepository,
};
use tempfile::tempdir;

fn stock(symbol: &str) -> Instrument {
    Instrument::new(symbol, Exchange::Us, Broker::Psina, symbol, InstrumentType::Stock)
        .with_currency("USD")
        .with_lot(1)
}

#[tokio::test]
async fn removed_flag_survives_consecutive_merges() {
    let dir = tempdir().unwrap();
    let path = init(dir.path().join("cache.db").to_str().unwrap()).unwrap();
    let pool = create_pool(&path).unwrap();
    run_migrations(&pool).unwrap();
    let writer = spawn_writer(pool.clone());

    let store = Arc::new(InstrumentCacheRepository::new(pool.clone(), writer.clone()));
    let versions = Arc::new(CacheVersionRepository::new(pool.clone(), writer));
    let merger = CacheMerger::new(store.clone(), versions.clone());
    let target = CacheTarget::new(Exchange::Us, Broker::Psina);

    let remote_removed: HashSet<String> = ["TSLA".to_string()].into();
    let first = merger
        .merge(&target, &[stock("AAPL"), stock("TSLA")], &remote_removed)
        .await
        .unwrap();
    assert_eq!(first.version, 1);
    assert_eq!(first.removed_preserved, 1);

    // Fresh fetch carries no flag; the cached one must stick.
    let second = merger
        .merge(&target, &[stock("AAPL"), stock("TSLA"), stock("MSFT")], &HashSet::new())
        .await
        .unwrap();
    assert_eq!(second.version, 2);
    assert_eq!(second.rows_written, 3);
    assert_eq!(second.removed_preserved, 1);

    let handle = store.open(&target).await.unwrap();
    let rows = handle.read_instruments().await.unwrap();
    assert_eq!(handle.read_version().await.unwrap(), Some(2));
    handle.close().await.unwrap();

    assert_eq!(rows.len(), 3);
    let tsla = rows.iter().find(|r| r.symbol == "TSLA").unwrap();
    assert_eq!(tsla.removed, Some(true));
    let aapl = rows.iter().find(|r| r.symbol == "AAPL").unwrap();
    assert_eq!(aapl.removed, None);
    assert_eq!(versions.current_version(&target).unwrap(), Some(2));
}
