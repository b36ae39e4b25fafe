//! Alor SPB Exchange dictionary.
//!
//! Reads the `Securities` market-data endpoint filtered to the SPBX board.
//! Instruments not quoted in RUB are restricted to qualified investors.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::errors::DictionaryError;
use crate::models::{
    Broker, Dictionary, DictionaryParams, Exchange, Instrument, InstrumentType, HOME_CURRENCY,
};
use crate::normalize::symbol::lot_from_f64;
use crate::provider::http::parse_json;
use crate::provider::{DictionarySource, SourceClient};

pub const DEFAULT_SECURITIES_URL: &str =
    "https://api.alor.ru/md/v2/Securities?exchange=SPBX&type=FOND&limit=4000&offset=0";
const PROVIDER_ID: &str = "ALOR";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Security {
    symbol: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    minstep: rust_decimal::Decimal,
    currency: Option<String>,
    lotsize: Option<f64>,
    #[serde(rename = "ISIN")]
    isin: Option<String>,
    #[serde(default)]
    cfi_code: String,
}

/// CFI category `C` is collective investment vehicles; `CB` (closed-end funds
/// traded like stocks) is excluded.
fn classify(cfi_code: &str) -> InstrumentType {
    if cfi_code.starts_with('C') && !cfi_code.starts_with("CB") {
        InstrumentType::Etf
    } else {
        InstrumentType::Stock
    }
}

fn map_security(security: Security) -> Instrument {
    let instrument_type = classify(&security.cfi_code);
    let for_qual = security.currency.as_deref() != Some(HOME_CURRENCY);

    let mut instrument = Instrument::new(
        security.symbol,
        Exchange::Spbx,
        Broker::Alor,
        security.description,
        instrument_type,
    )
    .with_min_price_increment(security.minstep.normalize());

    instrument.currency = security.currency;
    instrument.for_qual_investor_flag = for_qual;
    instrument.lot = security.lotsize.and_then(lot_from_f64);
    instrument.isin = security.isin;
    instrument
}

pub(crate) fn map_securities(body: &str) -> Result<Vec<Instrument>, DictionaryError> {
    let securities: Vec<Security> = parse_json(PROVIDER_ID, body)?;
    Ok(securities.into_iter().map(map_security).collect())
}

/// Alor SPB Exchange securities dictionary.
pub struct AlorSpbxProvider {
    client: SourceClient,
    url: String,
}

impl AlorSpbxProvider {
    pub fn new(client: SourceClient) -> Self {
        Self::with_url(client, DEFAULT_SECURITIES_URL)
    }

    pub fn with_url(client: SourceClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DictionarySource for AlorSpbxProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn dictionary(&self) -> Dictionary {
        Dictionary::AlorSpbx
    }

    async fn fetch(&self, _params: &DictionaryParams) -> Result<Vec<Instrument>, DictionaryError> {
        let request = self.client.http().request(Method::GET, &self.url);
        let body = self.client.send(PROVIDER_ID, request).await?;
        let instruments = map_securities(&body)?;

        debug!("Alor: mapped {} SPBX securities", instruments.len());
        Ok(instruments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SECURITIES: &str = r#"[
        {
            "symbol": "AAPL",
            "shortname": "Apple",
            "description": "Apple Inc.",
            "exchange": "SPBX",
            "type": "CS",
            "lotsize": 1.0,
            "minstep": 0.01,
            "currency": "USD",
            "ISIN": "US0378331005",
            "cfiCode": "ESXXXX"
        },
        {
            "symbol": "FXUS",
            "description": "FinEx US Equity UCITS ETF",
            "lotsize": 1,
            "minstep": 0.0005,
            "currency": "RUB",
            "ISIN": "IE00BD3QHZ91",
            "cfiCode": "CEOGEU"
        },
        {
            "symbol": "PSEC",
            "description": "Prospect Capital",
            "lotsize": 1,
            "minstep": 0.01,
            "currency": "USD",
            "ISIN": "US74348T1025",
            "cfiCode": "CBOXXX"
        },
        {
            "symbol": "NOCCY",
            "description": "No currency"
        }
    ]"#;

    #[test]
    fn test_maps_securities() {
        let instruments = map_securities(SECURITIES).unwrap();
        assert_eq!(instruments.len(), 4);

        let aapl = &instruments[0];
        assert_eq!(aapl.symbol, "AAPL");
        assert_eq!(aapl.exchange, Exchange::Spbx);
        assert_eq!(aapl.broker, Broker::Alor);
        assert_eq!(aapl.full_name, "Apple Inc.");
        assert_eq!(aapl.min_price_increment, dec!(0.01));
        assert_eq!(aapl.currency.as_deref(), Some("USD"));
        assert_eq!(aapl.lot, Some(1));
        assert_eq!(aapl.isin.as_deref(), Some("US0378331005"));
        assert_eq!(aapl.instrument_type, InstrumentType::Stock);
    }

    #[test]
    fn test_cfi_etf_classification() {
        let instruments = map_securities(SECURITIES).unwrap();
        assert_eq!(instruments[1].instrument_type, InstrumentType::Etf);
        assert_eq!(instruments[2].instrument_type, InstrumentType::Stock);
    }

    #[test]
    fn test_qualified_investor_flag_follows_currency() {
        let instruments = map_securities(SECURITIES).unwrap();
        assert!(instruments[0].for_qual_investor_flag);
        assert!(!instruments[1].for_qual_investor_flag);
        // Unknown currency is not the home currency.
        assert!(instruments[3].for_qual_investor_flag);
        assert_eq!(instruments[3].min_price_increment, dec!(0));
        assert_eq!(instruments[3].lot, None);
    }
}
