use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::{error::ApiResult, main_lib::AppState};
use ppp_core::errors::Error;
use ppp_core::instruments::{CacheTarget, DictionaryInfo, ImportRequest, ImportResult, ImportState};
use ppp_dictionaries::{Broker, Exchange};

async fn list_dictionaries(State(state): State<Arc<AppState>>) -> Json<Vec<DictionaryInfo>> {
    Json(state.import_service.dictionaries())
}

async fn run_import(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImportRequest>,
) -> ApiResult<Json<ImportResult>> {
    let result = state.import_service.run_import(request).await?;
    Ok(Json(result))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportStateResponse {
    state: ImportState,
    last_outcome: Option<ImportState>,
}

async fn get_import_state(State(state): State<Arc<AppState>>) -> Json<ImportStateResponse> {
    Json(ImportStateResponse {
        state: state.import_service.state(),
        last_outcome: state.import_service.last_outcome(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheVersionResponse {
    store: String,
    /// Version marker committed to the store.
    version: Option<i64>,
    /// Last version handed out by the allocator.
    allocated: Option<i64>,
}

async fn get_cache_version(
    Path((exchange, broker)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CacheVersionResponse>> {
    let exchange = exchange.parse::<Exchange>().map_err(Error::Validation)?;
    let broker = broker.parse::<Broker>().map_err(Error::Validation)?;
    let target = CacheTarget::new(exchange, broker);

    let handle = state.cache_store.open(&target).await?;
    let version = handle.read_version().await;
    if let Err(e) = handle.close().await {
        tracing::warn!("Failed to release cache store '{}': {}", target, e);
    }

    Ok(Json(CacheVersionResponse {
        store: target.store_name(),
        version: version?,
        allocated: state.cache_versions.current_version(&target)?,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/instruments/dictionaries", get(list_dictionaries))
        .route("/instruments/import", post(run_import))
        .route("/instruments/import/state", get(get_import_state))
        .route(
            "/instruments/cache/{exchange}/{broker}/version",
            get(get_cache_version),
        )
}
