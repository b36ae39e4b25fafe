use std::sync::Arc;

use crate::{config::Config, progress::TracingImportReporter};
use ppp_connect::RemoteDataClient;
use ppp_core::instruments::{
    CacheMerger, ImportConfig, InstrumentCacheStore, InstrumentImportService,
    InstrumentImportServiceTrait,
};
use ppp_dictionaries::{DictionaryRegistry, SourceClient};
use ppp_storage_sqlite::{
    db::{self, write_actor},
    CacheVersionRepository, InstrumentCacheRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub import_service: Arc<dyn InstrumentImportServiceTrait>,
    pub cache_store: Arc<dyn InstrumentCacheStore>,
    pub cache_versions: Arc<CacheVersionRepository>,
}

/// Installs the global subscriber. `log` records from the library crates are
/// bridged into it.
pub fn init_tracing() {
    let log_format = std::env::var("PPP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer(pool.clone());

    let cache_store = Arc::new(InstrumentCacheRepository::new(pool.clone(), writer.clone()));
    let cache_versions = Arc::new(CacheVersionRepository::new(pool.clone(), writer));

    let mut source_client = SourceClient::with_timeout(config.request_timeout);
    if let Some(relay) = &config.service_machine_url {
        tracing::info!("Routing relay-capable sources through {}", relay);
        source_client = source_client.with_relay(relay.clone());
    }
    let registry = Arc::new(DictionaryRegistry::with_defaults(
        source_client,
        config.tinkoff_classes.clone(),
    ));

    let remote = Arc::new(RemoteDataClient::with_timeout(
        &config.remote_url,
        config.remote_api_key.as_deref(),
        config.request_timeout,
    )?);

    let merger = CacheMerger::new(cache_store.clone(), cache_versions.clone());
    let import_service = Arc::new(InstrumentImportService::new(
        registry,
        remote.clone(),
        remote,
        merger,
        Arc::new(TracingImportReporter),
        ImportConfig::default(),
    ));

    Ok(Arc::new(AppState {
        import_service,
        cache_store,
        cache_versions,
    }))
}
