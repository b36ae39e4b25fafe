//! Psina US stocks dictionary.
//!
//! The operator supplies the dictionary URL; the list is a JSON array of
//! `{symbol, fullName}` objects. Tickers use `-` as the class separator.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::errors::DictionaryError;
use crate::models::{Broker, Dictionary, DictionaryParams, Exchange, Instrument, InstrumentType};
use crate::normalize::symbol::space_separator;
use crate::provider::http::parse_json;
use crate::provider::{DictionarySource, SourceClient};

const PROVIDER_ID: &str = "PSINA";

/// Lower-case fragments of fund issuers whose products are all ETFs.
const ETF_ISSUERS: [&str; 3] = ["invesco", "proshares", "ishares"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PsinaSymbol {
    symbol: String,
    #[serde(default)]
    full_name: String,
}

fn classify(full_name: &str) -> InstrumentType {
    let lower = full_name.to_lowercase();
    if full_name.to_uppercase().ends_with(" ETF") || ETF_ISSUERS.iter().any(|i| lower.contains(i)) {
        InstrumentType::Etf
    } else {
        InstrumentType::Stock
    }
}

pub(crate) fn map_symbols(body: &str) -> Result<Vec<Instrument>, DictionaryError> {
    let symbols: Vec<PsinaSymbol> = parse_json(PROVIDER_ID, body)?;

    Ok(symbols
        .into_iter()
        .map(|s| {
            let instrument_type = classify(&s.full_name);
            Instrument::new(
                space_separator(&s.symbol, '-'),
                Exchange::Us,
                Broker::Psina,
                s.full_name,
                instrument_type,
            )
            .with_currency("USD")
            .with_lot(1)
        })
        .collect())
}

/// US stocks list published by the Psina brokerage.
pub struct PsinaUsStocksProvider {
    client: SourceClient,
}

impl PsinaUsStocksProvider {
    pub fn new(client: SourceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DictionarySource for PsinaUsStocksProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn dictionary(&self) -> Dictionary {
        Dictionary::PsinaUsStocks
    }

    fn validate_params(&self, params: &DictionaryParams) -> Result<(), DictionaryError> {
        params.require_url().map(|_| ())
    }

    async fn fetch(&self, params: &DictionaryParams) -> Result<Vec<Instrument>, DictionaryError> {
        let url = params.require_url()?;
        let body = self
            .client
            .send_relayed(PROVIDER_ID, Method::GET, url.as_str(), None)
            .await?;
        let instruments = map_symbols(&body)?;

        debug!("Psina: mapped {} US symbols", instruments.len());
        Ok(instruments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    const SYMBOLS: &str = r#"[
        {"symbol": "AAPL", "fullName": "Apple Inc."},
        {"symbol": "BRK-B", "fullName": "Berkshire Hathaway Inc."},
        {"symbol": "SPY", "fullName": "SPDR S&P 500 ETF"},
        {"symbol": "QQQ", "fullName": "Invesco QQQ Trust"},
        {"symbol": "IVV", "fullName": "ISHARES CORE S&P 500"},
        {"symbol": "METF", "fullName": "Metfone Holdings"}
    ]"#;

    #[test]
    fn test_maps_us_symbols() {
        let instruments = map_symbols(SYMBOLS).unwrap();
        assert_eq!(instruments.len(), 6);

        let brk = &instruments[1];
        assert_eq!(brk.symbol, "BRK B");
        assert_eq!(brk.exchange, Exchange::Us);
        assert_eq!(brk.broker, Broker::Psina);
        assert_eq!(brk.full_name, "Berkshire Hathaway Inc.");
        assert_eq!(brk.min_price_increment, Decimal::ZERO);
        assert_eq!(brk.currency.as_deref(), Some("USD"));
        assert_eq!(brk.lot, Some(1));
        assert!(!brk.for_qual_investor_flag);
    }

    #[test]
    fn test_etf_classification() {
        let types: Vec<InstrumentType> = map_symbols(SYMBOLS)
            .unwrap()
            .into_iter()
            .map(|i| i.instrument_type)
            .collect();
        assert_eq!(
            types,
            vec![
                InstrumentType::Stock,
                InstrumentType::Stock,
                InstrumentType::Etf,
                InstrumentType::Etf,
                InstrumentType::Etf,
                InstrumentType::Stock,
            ]
        );
    }

    #[test]
    fn test_missing_url_fails_validation() {
        let provider = PsinaUsStocksProvider::new(SourceClient::new());

        let error = provider.validate_params(&DictionaryParams::default()).unwrap_err();
        assert!(matches!(error, DictionaryError::ValidationFailed { .. }));

        let error = provider
            .validate_params(&DictionaryParams::with_url(""))
            .unwrap_err();
        assert!(matches!(error, DictionaryError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn test_fetch_without_url_never_reaches_network() {
        // Relay points at a closed port; a network attempt would surface as Request.
        let client = SourceClient::new().with_relay("http://127.0.0.1:9/".parse().unwrap());
        let provider = PsinaUsStocksProvider::new(client);

        let error = provider.fetch(&DictionaryParams::default()).await.unwrap_err();
        assert!(matches!(error, DictionaryError::ValidationFailed { .. }));
    }
}
