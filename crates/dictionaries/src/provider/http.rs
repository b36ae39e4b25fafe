//! Shared HTTP plumbing for the adapters.
//!
//! Every adapter performs plain JSON requests. Some sources are not reachable
//! from the operator's network directly and go through an optional fetch
//! relay ("service machine"): `POST <relay>/fetch` with the target method,
//! URL and body in a JSON envelope.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::errors::DictionaryError;

/// Default timeout for source requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest slice of an error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Serialize)]
struct RelayEnvelope<'a> {
    method: &'a str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
}

/// HTTP client shared by all adapters.
#[derive(Debug, Clone)]
pub struct SourceClient {
    client: Client,
    relay: Option<Url>,
}

impl SourceClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            relay: None,
        }
    }

    /// Route relay-capable requests through `relay`.
    pub fn with_relay(mut self, relay: Url) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn relay(&self) -> Option<&Url> {
        self.relay.as_ref()
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Sends a prepared request and returns the body of a 2xx response.
    pub(crate) async fn send(
        &self,
        provider: &str,
        request: RequestBuilder,
    ) -> Result<String, DictionaryError> {
        let response = request.send().await.map_err(|e| DictionaryError::Request {
            provider: provider.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| DictionaryError::Request {
            provider: provider.to_string(),
            message: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            return Err(DictionaryError::HttpStatus {
                provider: provider.to_string(),
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(body)
    }

    /// Performs `method url` through the relay when one is configured, directly otherwise.
    pub(crate) async fn send_relayed(
        &self,
        provider: &str,
        method: Method,
        url: &str,
        body: Option<&str>,
    ) -> Result<String, DictionaryError> {
        let request = match &self.relay {
            Some(relay) => {
                let endpoint = relay.join("fetch").map_err(|e| DictionaryError::Request {
                    provider: provider.to_string(),
                    message: format!("Invalid relay URL: {}", e),
                })?;
                debug!("{} request via relay: {} {}", provider, method, url);

                self.client.post(endpoint).json(&RelayEnvelope {
                    method: method.as_str(),
                    url,
                    body,
                })
            }
            None => {
                debug!("{} request: {} {}", provider, method, url);

                let request = self.client.request(method, url);
                match body {
                    Some(body) => request
                        .header(reqwest::header::CONTENT_TYPE, "application/json")
                        .body(body.to_string()),
                    None => request,
                }
            }
        };

        self.send(provider, request).await
    }
}

impl Default for SourceClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a response body, mapping errors to [`DictionaryError::Parse`].
pub(crate) fn parse_json<T: DeserializeOwned>(
    provider: &str,
    body: &str,
) -> Result<T, DictionaryError> {
    serde_json::from_str(body).map_err(|e| DictionaryError::parse(provider, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_envelope_omits_missing_body() {
        let envelope = RelayEnvelope {
            method: "GET",
            url: "https://example.com/us.json",
            body: None,
        };
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"method":"GET","url":"https://example.com/us.json"}"#
        );
    }

    #[test]
    fn test_relay_endpoint_join() {
        let client =
            SourceClient::new().with_relay(Url::parse("https://relay.example.com/").unwrap());
        let endpoint = client.relay().unwrap().join("fetch").unwrap();
        assert_eq!(endpoint.as_str(), "https://relay.example.com/fetch");
    }

    #[test]
    fn test_parse_json_maps_error() {
        let result: Result<Vec<u32>, _> = parse_json("ALOR", "{}");
        assert!(matches!(result, Err(DictionaryError::Parse { .. })));
    }
}
