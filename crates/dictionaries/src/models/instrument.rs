use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{Broker, Exchange};

/// Instrument classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    Stock,
    Etf,
    Cryptocurrency,
}

/// Identity of an instrument in the remote collection and the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstrumentKey {
    pub symbol: String,
    pub exchange: Exchange,
    pub broker: Broker,
}

/// Canonical instrument record produced by every dictionary.
///
/// Source-specific fields (Binance asset codes, Tinkoff FIGI, ...) live in
/// `extensions` and are flattened next to the canonical fields on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub exchange: Exchange,
    pub broker: Broker,
    pub full_name: String,
    /// Tick size; zero means unknown.
    pub min_price_increment: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_quantity_increment: Option<Decimal>,
    #[serde(rename = "type")]
    pub instrument_type: InstrumentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default)]
    pub for_qual_investor_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,
    /// Sticky user-set exclusion flag. Adapters never set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Instrument {
    pub fn new(
        symbol: impl Into<String>,
        exchange: Exchange,
        broker: Broker,
        full_name: impl Into<String>,
        instrument_type: InstrumentType,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            broker,
            full_name: full_name.into(),
            min_price_increment: Decimal::ZERO,
            min_quantity_increment: None,
            instrument_type,
            currency: None,
            for_qual_investor_flag: false,
            lot: None,
            isin: None,
            removed: None,
            extensions: Map::new(),
        }
    }

    pub fn key(&self) -> InstrumentKey {
        InstrumentKey {
            symbol: self.symbol.clone(),
            exchange: self.exchange,
            broker: self.broker,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }

    pub fn with_min_price_increment(mut self, value: Decimal) -> Self {
        self.min_price_increment = value;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_lot(mut self, lot: u32) -> Self {
        self.lot = Some(lot);
        self
    }

    pub fn with_extension(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.to_string(), value.into());
        self
    }
}
