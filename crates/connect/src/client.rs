//! HTTP client for the remote document collection.
//!
//! The remote side exposes one functions endpoint with `bulkWrite` and
//! `find`. The instrument collection and the broker-profile lookup are both
//! served by [`RemoteDataClient`].

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;

use crate::documents::mapping::{
    profile_from_document, removed_symbols_from_documents, sort_profiles, summary_from_reply,
};
use crate::documents::{
    BrokerDocument, BulkWriteReply, BulkWriteRequest, FindRequest, RemoteErrorResponse,
};
use ppp_core::errors::{Error, Result};
use ppp_core::instruments::{
    BrokerProfile, BrokerProfileLookup, BulkWriteSummary, InstrumentCollectionTrait, UpsertSpec,
    INSTRUMENTS_COLLECTION,
};
use ppp_dictionaries::{Broker, Exchange};

/// Default timeout for remote requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const BULK_WRITE_PATH: &str = "/functions/bulkWrite";
pub const FIND_PATH: &str = "/functions/find";

/// Collection holding broker profiles.
pub const BROKERS_COLLECTION: &str = "brokers";

/// Client for the remote functions endpoint.
///
/// # Example
///
/// ```ignore
/// let client = RemoteDataClient::new("https://data.example.org", Some("api-key"))?;
/// let removed = client.find_removed_symbols(Exchange::Us, Broker::Psina).await?;
/// ```
#[derive(Debug, Clone)]
pub struct RemoteDataClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: Option<HeaderValue>,
}

impl RemoteDataClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// # Errors
    ///
    /// Returns an error if the key is not a valid header value or the HTTP
    /// client cannot be initialized.
    pub fn with_timeout(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let auth_header = api_key
            .filter(|key| !key.is_empty())
            .map(|key| {
                HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|e| Error::Unexpected(format!("Invalid API key format: {}", e)))
            })
            .transpose()?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(auth) = &self.auth_header {
            headers.insert(AUTHORIZATION, auth.clone());
        }
        headers
    }

    /// Make a POST request and parse the response.
    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[Remote] POST {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Remote(format!("Request to {} failed: {}", path, e)))?;

        self.parse_response(response).await
    }

    async fn parse_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Remote(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<RemoteErrorResponse>(&body) {
                if let Some(msg) = err.message.or(err.error) {
                    return Err(Error::Remote(format!("Remote error {}: {}", status, msg)));
                }
            }
            return Err(Error::Remote(format!(
                "Remote error {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::Remote(format!(
                "Failed to parse response: {} - {}",
                e,
                body.chars().take(200).collect::<String>()
            ))
        })
    }

    /// Unordered `updateOne` batch against `collection`.
    pub async fn bulk_write_documents(
        &self,
        collection: &str,
        operations: &[UpsertSpec],
    ) -> Result<BulkWriteSummary> {
        let request = BulkWriteRequest::unordered(collection, operations);
        let reply: BulkWriteReply = self.post(BULK_WRITE_PATH, &request).await?;
        Ok(summary_from_reply(reply))
    }

    /// Raw documents of `collection` matching `filter`.
    pub async fn find_documents(
        &self,
        collection: &str,
        filter: Value,
        sort: Option<Value>,
    ) -> Result<Vec<Value>> {
        let request = FindRequest {
            collection,
            filter,
            sort,
        };
        // Some deployments answer `null` for an empty result.
        let documents: Option<Vec<Value>> = self.post(FIND_PATH, &request).await?;
        Ok(documents.unwrap_or_default())
    }
}

#[async_trait]
impl InstrumentCollectionTrait for RemoteDataClient {
    async fn bulk_write(&self, operations: &[UpsertSpec]) -> Result<BulkWriteSummary> {
        let summary = self
            .bulk_write_documents(INSTRUMENTS_COLLECTION, operations)
            .await?;
        info!(
            "[Remote] bulkWrite: {} operations, matched {}, upserted {}, {} errors",
            operations.len(),
            summary.matched,
            summary.upserted,
            summary.errors.len()
        );
        Ok(summary)
    }

    async fn find_removed_symbols(
        &self,
        exchange: Exchange,
        broker: Broker,
    ) -> Result<HashSet<String>> {
        let documents = self
            .find_documents(
                INSTRUMENTS_COLLECTION,
                json!({ "exchange": exchange, "broker": broker, "removed": true }),
                None,
            )
            .await?;
        let total = documents.len();
        let removed = removed_symbols_from_documents(documents);
        debug!(
            "[Remote] {}:{} has {} removed symbols ({} documents)",
            exchange,
            broker,
            removed.len(),
            total
        );
        Ok(removed)
    }
}

#[async_trait]
impl BrokerProfileLookup for RemoteDataClient {
    async fn list_profiles(&self, broker: Broker) -> Result<Vec<BrokerProfile>> {
        let documents = self
            .find_documents(
                BROKERS_COLLECTION,
                json!({ "type": broker, "removed": { "$ne": true } }),
                Some(json!({ "updatedAt": -1 })),
            )
            .await?;

        let mut profiles = Vec::with_capacity(documents.len());
        for document in documents {
            match serde_json::from_value::<BrokerDocument>(document) {
                Ok(doc) => profiles.extend(profile_from_document(doc, broker)),
                Err(e) => warn!("[Remote] Skipping malformed broker document: {}", e),
            }
        }
        sort_profiles(&mut profiles);

        debug!("[Remote] {} {} profiles", profiles.len(), broker);
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppp_dictionaries::{Instrument, InstrumentType};
    use rust_decimal_macros::dec;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RemoteDataClient::new("https://data.example.org/", None).unwrap();
        assert_eq!(client.base_url(), "https://data.example.org");
    }

    #[test]
    fn test_empty_api_key_sends_no_authorization() {
        let client = RemoteDataClient::new("https://data.example.org", Some("")).unwrap();
        assert!(client.headers().get(AUTHORIZATION).is_none());

        let client = RemoteDataClient::new("https://data.example.org", Some("k")).unwrap();
        assert_eq!(client.headers().get(AUTHORIZATION).unwrap(), "Bearer k");
    }

    #[test]
    fn test_bulk_write_request_wire_shape() {
        let instrument = Instrument::new(
            "BTCUSDT",
            Exchange::Binance,
            Broker::Binance,
            "BTC/USDT",
            InstrumentType::Cryptocurrency,
        )
        .with_min_price_increment(dec!(0.01));
        let specs = vec![UpsertSpec::for_instrument(&instrument)];

        let request = BulkWriteRequest::unordered(INSTRUMENTS_COLLECTION, &specs);
        let body = serde_json::to_value(request).unwrap();

        assert_eq!(body["collection"], "instruments");
        assert_eq!(body["options"], json!({"ordered": false}));
        let op = &body["operations"][0]["updateOne"];
        assert_eq!(
            op["filter"],
            json!({"symbol": "BTCUSDT", "exchange": "binance", "broker": "binance"})
        );
        assert_eq!(op["upsert"], true);
        assert_eq!(op["update"]["$set"]["fullName"], "BTC/USDT");
        assert_eq!(op["update"]["$set"]["minPriceIncrement"], 0.01);
        assert!(op["update"]["$set"].get("removed").is_none());
    }

    #[test]
    fn test_find_request_omits_missing_sort() {
        let body = serde_json::to_value(FindRequest {
            collection: "instruments",
            filter: json!({"exchange": Exchange::Rus, "broker": Broker::Tinkoff}),
            sort: None,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({"collection": "instruments", "filter": {"exchange": "rus", "broker": "tinkoff"}})
        );
    }
}
