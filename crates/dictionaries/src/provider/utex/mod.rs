//! UTEX margin stocks dictionary.
//!
//! The symbol list comes from the mobile meta service
//! (`getSymbolsIncludingMargin`). Margin codes look like `M_AAPL/USD`;
//! prices are fixed-point integers with 8 decimal places.
//!
//! The endpoint is usually reached through the fetch relay.

use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::DictionaryError;
use crate::models::{Broker, Dictionary, DictionaryParams, Exchange, Instrument, InstrumentType};
use crate::normalize::symbol::{lot_from_f64, segment_after, space_separator};
use crate::provider::http::parse_json;
use crate::provider::{DictionarySource, SourceClient};

pub const DEFAULT_SYMBOLS_URL: &str = "https://ususdt-api-margin.utex.io/rest/grpc/com.unitedtraders.luna.utex.protocol.mobile.MobileMetaService.getSymbolsIncludingMargin";
const PROVIDER_ID: &str = "UTEX";

const MARGIN_PREFIX: &str = "M_";
/// Decimal places of `priceStep`.
const PRICE_SCALE: u32 = 8;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolsResponse {
    #[serde(default)]
    symbols_info: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    id: Value,
    // Field name is misspelled by the API.
    #[serde(rename = "tagetCurrencyInfo")]
    target_currency_info: CurrencyInfo,
    base_currency_info: Option<CurrencyInfo>,
    #[serde(default)]
    price_step: i64,
    qty_step: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CurrencyInfo {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

fn map_symbol(info: SymbolInfo) -> Result<Instrument, DictionaryError> {
    let code = &info.target_currency_info.code;
    let ticker = segment_after(code, MARGIN_PREFIX).ok_or_else(|| {
        DictionaryError::parse(PROVIDER_ID, format!("Unexpected margin code: {}", code))
    })?;

    let full_name = info
        .target_currency_info
        .description
        .clone()
        .unwrap_or_default();

    let mut instrument = Instrument::new(
        space_separator(ticker, '/'),
        Exchange::UtexMarginStocks,
        Broker::Utex,
        full_name,
        InstrumentType::Stock,
    )
    .with_min_price_increment(Decimal::new(info.price_step, PRICE_SCALE).normalize())
    .with_extension("utexSymbolID", info.id);

    instrument.currency = info
        .base_currency_info
        .as_ref()
        .and_then(|c| segment_after(&c.code, MARGIN_PREFIX))
        .map(str::to_string);
    instrument.lot = info.qty_step.and_then(lot_from_f64);

    Ok(instrument)
}

/// Maps a `getSymbolsIncludingMargin` body to instruments.
///
/// Entries without a target-currency description are not tradable symbols and are skipped.
pub(crate) fn map_symbols(body: &str) -> Result<Vec<Instrument>, DictionaryError> {
    let response: SymbolsResponse = parse_json(PROVIDER_ID, body)?;

    response
        .symbols_info
        .into_iter()
        .filter(|s| {
            s.target_currency_info
                .description
                .as_deref()
                .is_some_and(|d| !d.is_empty())
        })
        .map(map_symbol)
        .collect()
}

/// UTEX margin stocks dictionary.
pub struct UtexMarginProvider {
    client: SourceClient,
    url: String,
}

impl UtexMarginProvider {
    pub fn new(client: SourceClient) -> Self {
        Self::with_url(client, DEFAULT_SYMBOLS_URL)
    }

    pub fn with_url(client: SourceClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DictionarySource for UtexMarginProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn dictionary(&self) -> Dictionary {
        Dictionary::UtexMarginStocks
    }

    async fn fetch(&self, _params: &DictionaryParams) -> Result<Vec<Instrument>, DictionaryError> {
        let body = self
            .client
            .send_relayed(PROVIDER_ID, Method::POST, &self.url, Some("{}"))
            .await?;
        let instruments = map_symbols(&body)?;

        debug!("UTEX: mapped {} margin symbols", instruments.len());
        Ok(instruments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SYMBOLS: &str = r#"{
        "symbolsInfo": [
            {
                "id": 1042,
                "tagetCurrencyInfo": {"code": "M_BRK/B", "description": "Berkshire Hathaway Inc. Class B"},
                "baseCurrencyInfo": {"code": "M_USDT", "description": "Tether"},
                "priceStep": 12345678,
                "qtyStep": 1
            },
            {
                "id": 7,
                "tagetCurrencyInfo": {"code": "M_AAPL", "description": "Apple Inc."},
                "baseCurrencyInfo": {"code": "USDT"},
                "priceStep": 1000000,
                "qtyStep": 0.5
            },
            {
                "id": 8,
                "tagetCurrencyInfo": {"code": "BTC", "description": ""},
                "baseCurrencyInfo": {"code": "USDT"},
                "priceStep": 100
            },
            {
                "id": 9,
                "tagetCurrencyInfo": {"code": "ETH"},
                "priceStep": 100
            }
        ]
    }"#;

    #[test]
    fn test_maps_margin_symbols() {
        let instruments = map_symbols(SYMBOLS).unwrap();
        assert_eq!(instruments.len(), 2);

        let brk = &instruments[0];
        assert_eq!(brk.symbol, "BRK B");
        assert_eq!(brk.exchange, Exchange::UtexMarginStocks);
        assert_eq!(brk.broker, Broker::Utex);
        assert_eq!(brk.full_name, "Berkshire Hathaway Inc. Class B");
        assert_eq!(brk.instrument_type, InstrumentType::Stock);
        assert_eq!(brk.currency.as_deref(), Some("USDT"));
        assert!(!brk.for_qual_investor_flag);
        assert_eq!(brk.lot, Some(1));
        assert_eq!(brk.extensions["utexSymbolID"], 1042);
    }

    #[test]
    fn test_price_step_is_fixed_point() {
        let instruments = map_symbols(SYMBOLS).unwrap();
        assert_eq!(instruments[0].min_price_increment, dec!(0.12345678));
        assert_eq!(instruments[1].min_price_increment, dec!(0.01));
    }

    #[test]
    fn test_base_currency_without_prefix_is_unset() {
        let instruments = map_symbols(SYMBOLS).unwrap();
        let aapl = &instruments[1];
        assert_eq!(aapl.symbol, "AAPL");
        assert_eq!(aapl.currency, None);
        assert_eq!(aapl.lot, None);
    }

    #[test]
    fn test_target_code_without_prefix_is_parse_error() {
        let body = r#"{"symbolsInfo": [{"id": 1, "tagetCurrencyInfo": {"code": "AAPL", "description": "Apple"}, "priceStep": 1}]}"#;
        assert!(matches!(map_symbols(body), Err(DictionaryError::Parse { .. })));
    }
}
