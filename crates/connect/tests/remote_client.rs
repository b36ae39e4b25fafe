use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use ppp_connect::RemoteDataClient;
use ppp_core::errors::Error;
use ppp_core::instruments::{BrokerProfileLookup, InstrumentCollectionTrait, UpsertSpec};
use ppp_dictionaries::{Broker, Exchange, Instrument, InstrumentType};

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn bulk_write(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        recorded.auth.lock().unwrap().push(auth.to_string());
    }
    recorded.bodies.lock().unwrap().push(body);
    Json(json!({
        "matchedCount": 1,
        "modifiedCount": 1,
        "upsertedCount": 1,
        "writeErrors": [{"index": 1, "errmsg": "document failed validation"}]
    }))
}

async fn find(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    recorded.bodies.lock().unwrap().push(body.clone());
    match body["collection"].as_str() {
        Some("brokers") => Json(json!([
            {"_id": "b-1", "type": "tinkoff", "apiToken": "secret", "updatedAt": "2026-01-02T00:00:00Z"}
        ])),
        // Written by older clients: fractional lot, lot as a double, string increment.
        _ => Json(json!([
            {
                "_id": "i-1",
                "symbol": "TSLA",
                "exchange": "us",
                "broker": "psina",
                "fullName": "Tesla",
                "minPriceIncrement": 0.01,
                "type": "stock",
                "lot": 0.5,
                "removed": true
            },
            {"_id": "i-2", "symbol": "AAPL", "lot": 1.0, "minPriceIncrement": "0.01", "removed": true},
            {"_id": "i-3", "symbol": "MSFT", "removed": false}
        ])),
    }
}

async fn spawn_remote(recorded: Recorded) -> String {
    let app = Router::new()
        .route("/functions/bulkWrite", post(bulk_write))
        .route("/functions/find", post(find))
        .route(
            "/broken/functions/find",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "cluster unavailable"})),
                )
            }),
        )
        .with_state(recorded);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn stock(symbol: &str) -> Instrument {
    Instrument::new(symbol, Exchange::Us, Broker::Psina, symbol, InstrumentType::Stock)
}

#[tokio::test]
async fn bulk_write_posts_unordered_batch_with_bearer() {
    let recorded = Recorded::default();
    let base = spawn_remote(recorded.clone()).await;
    let client = RemoteDataClient::new(&base, Some("api-key")).unwrap();

    let specs: Vec<UpsertSpec> = [stock("AAPL"), stock("BAD")]
        .iter()
        .map(UpsertSpec::for_instrument)
        .collect();
    let summary = client.bulk_write(&specs).await.unwrap();

    assert_eq!(summary.upserted, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].index, 1);

    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(bodies[0]["collection"], "instruments");
    assert_eq!(bodies[0]["options"]["ordered"], false);
    assert_eq!(bodies[0]["operations"].as_array().unwrap().len(), 2);
    assert_eq!(recorded.auth.lock().unwrap()[0], "Bearer api-key");
}

#[tokio::test]
async fn removed_symbols_survive_off_schema_documents() {
    let recorded = Recorded::default();
    let base = spawn_remote(recorded.clone()).await;
    let client = RemoteDataClient::new(&base, None).unwrap();

    let removed = client
        .find_removed_symbols(Exchange::Us, Broker::Psina)
        .await
        .unwrap();

    let mut symbols: Vec<String> = removed.into_iter().collect();
    symbols.sort();
    assert_eq!(symbols, vec!["AAPL".to_string(), "TSLA".to_string()]);
    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(
        bodies[0]["filter"],
        json!({"exchange": "us", "broker": "psina", "removed": true})
    );
}

#[tokio::test]
async fn list_profiles_queries_live_profiles_newest_first() {
    let recorded = Recorded::default();
    let base = spawn_remote(recorded.clone()).await;
    let client = RemoteDataClient::new(&base, None).unwrap();

    let profiles = client.list_profiles(Broker::Tinkoff).await.unwrap();

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, "b-1");
    assert_eq!(profiles[0].api_token.as_deref(), Some("secret"));
    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(
        bodies[0],
        json!({
            "collection": "brokers",
            "filter": {"type": "tinkoff", "removed": {"$ne": true}},
            "sort": {"updatedAt": -1}
        })
    );
}

#[tokio::test]
async fn remote_error_status_is_reported() {
    let base = spawn_remote(Recorded::default()).await;
    let client = RemoteDataClient::new(&format!("{}/broken", base), None).unwrap();

    let error = client
        .find_removed_symbols(Exchange::Us, Broker::Psina)
        .await
        .unwrap_err();

    match error {
        Error::Remote(msg) => assert!(msg.contains("cluster unavailable")),
        other => panic!("expected a remote error, got {:?}", other),
    }
}
