//! Binance dictionary.
//!
//! One record per spot symbol from `/api/v3/exchangeInfo`. Increments come
//! from the symbol's filter list, selected by `filterType`:
//! - `PRICE_FILTER` → tick size
//! - `LOT_SIZE` → quantity step
//! - `MIN_NOTIONAL` (or the newer `NOTIONAL`) → minimum order notional

use async_trait::async_trait;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::errors::DictionaryError;
use crate::models::{Broker, Dictionary, DictionaryParams, Exchange, Instrument, InstrumentType};
use crate::normalize::symbol::parse_decimal;
use crate::provider::http::parse_json;
use crate::provider::{DictionarySource, SourceClient};

pub const DEFAULT_EXCHANGE_INFO_URL: &str = "https://api.binance.com/api/v3/exchangeInfo";
const PROVIDER_ID: &str = "BINANCE";

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct ExchangeInfoResponse {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    base_asset: String,
    quote_asset: String,
    #[serde(default)]
    filters: Vec<SymbolFilter>,
}

/// Filters are a tagged bag of optional string fields; only the ones we read are listed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolFilter {
    filter_type: String,
    tick_size: Option<String>,
    step_size: Option<String>,
    min_notional: Option<String>,
}

// ============================================================================
// Mapping
// ============================================================================

fn filter_value(
    filters: &[SymbolFilter],
    filter_type: &str,
    field: fn(&SymbolFilter) -> Option<&String>,
    symbol: &str,
) -> Result<Option<Decimal>, DictionaryError> {
    let Some(raw) = filters
        .iter()
        .find(|f| f.filter_type == filter_type)
        .and_then(field)
    else {
        return Ok(None);
    };

    parse_decimal(raw).map(Some).ok_or_else(|| {
        DictionaryError::parse(
            PROVIDER_ID,
            format!("Invalid {} value '{}' for {}", filter_type, raw, symbol),
        )
    })
}

fn map_symbol(info: SymbolInfo) -> Result<Instrument, DictionaryError> {
    let tick_size = filter_value(
        &info.filters,
        "PRICE_FILTER",
        |f| f.tick_size.as_ref(),
        &info.symbol,
    )?;
    let step_size = filter_value(
        &info.filters,
        "LOT_SIZE",
        |f| f.step_size.as_ref(),
        &info.symbol,
    )?;
    let min_notional = match filter_value(
        &info.filters,
        "MIN_NOTIONAL",
        |f| f.min_notional.as_ref(),
        &info.symbol,
    )? {
        Some(value) => Some(value),
        None => filter_value(
            &info.filters,
            "NOTIONAL",
            |f| f.min_notional.as_ref(),
            &info.symbol,
        )?,
    };

    let mut instrument = Instrument::new(
        info.symbol,
        Exchange::Binance,
        Broker::Binance,
        format!("{}/{}", info.base_asset, info.quote_asset),
        InstrumentType::Cryptocurrency,
    )
    .with_min_price_increment(tick_size.unwrap_or(Decimal::ZERO))
    .with_extension("baseCryptoAsset", info.base_asset)
    .with_extension("quoteCryptoAsset", info.quote_asset);

    instrument.min_quantity_increment = step_size;

    if let Some(notional) = min_notional {
        let value = serde_json::to_value(notional)
            .map_err(|e| DictionaryError::parse(PROVIDER_ID, e.to_string()))?;
        instrument = instrument.with_extension("minNotional", value);
    }

    Ok(instrument)
}

/// Maps an `exchangeInfo` body to instruments.
pub(crate) fn map_exchange_info(body: &str) -> Result<Vec<Instrument>, DictionaryError> {
    let response: ExchangeInfoResponse = parse_json(PROVIDER_ID, body)?;
    response.symbols.into_iter().map(map_symbol).collect()
}

// ============================================================================
// BinanceProvider
// ============================================================================

/// Binance spot exchange dictionary.
pub struct BinanceProvider {
    client: SourceClient,
    url: String,
}

impl BinanceProvider {
    pub fn new(client: SourceClient) -> Self {
        Self::with_url(client, DEFAULT_EXCHANGE_INFO_URL)
    }

    pub fn with_url(client: SourceClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DictionarySource for BinanceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn dictionary(&self) -> Dictionary {
        Dictionary::Binance
    }

    async fn fetch(&self, _params: &DictionaryParams) -> Result<Vec<Instrument>, DictionaryError> {
        let request = self.client.http().request(Method::GET, &self.url);
        let body = self.client.send(PROVIDER_ID, request).await?;
        let instruments = map_exchange_info(&body)?;

        debug!("Binance: mapped {} symbols", instruments.len());
        Ok(instruments)
    }
}
