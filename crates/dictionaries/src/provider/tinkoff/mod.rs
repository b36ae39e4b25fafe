//! Tinkoff Invest dictionary.
//!
//! Instruments are listed per class through the REST gateway
//! (`InstrumentsService/Shares`, `InstrumentsService/Etfs`, ...). Only the two
//! real exchanges the terminal trades on are kept:
//! - `REAL_EXCHANGE_MOEX` → `moex`
//! - `REAL_EXCHANGE_RTS` → `spbx`
//!
//! Class calls are independent. A class whose call cannot complete or
//! returns an unreadable body is logged and skipped (see [`SubCallPolicy::Tolerate`]).

mod models;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};

use crate::errors::{DictionaryError, SubCallPolicy};
use crate::models::{Broker, Dictionary, DictionaryParams, Exchange, Instrument, InstrumentType};
use crate::normalize::symbol::space_separator;
use crate::provider::http::parse_json;
use crate::provider::{DictionarySource, SourceClient};

use models::{InstrumentsRequest, InstrumentsResponse, TinkoffInstrument};

pub const DEFAULT_BASE_URL: &str =
    "https://invest-public-api.tinkoff.ru/rest/tinkoff.public.invest.api.contract.v1.InstrumentsService";
const PROVIDER_ID: &str = "TINKOFF";
const APP_NAME_HEADER: &str = "x-app-name";
const APP_NAME: &str = "johnpantini.ppp";

/// Instrument classes served by `InstrumentsService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TinkoffInstrumentClass {
    Shares,
    Etfs,
}

impl TinkoffInstrumentClass {
    /// RPC method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::Shares => "Shares",
            Self::Etfs => "Etfs",
        }
    }

    fn instrument_type(&self) -> InstrumentType {
        match self {
            Self::Shares => InstrumentType::Stock,
            Self::Etfs => InstrumentType::Etf,
        }
    }
}

impl fmt::Display for TinkoffInstrumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

impl FromStr for TinkoffInstrumentClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shares" => Ok(Self::Shares),
            "etfs" => Ok(Self::Etfs),
            other => Err(format!("Unknown Tinkoff instrument class: {}", other)),
        }
    }
}

fn exchange_for(real_exchange: &str) -> Option<Exchange> {
    match real_exchange {
        "REAL_EXCHANGE_MOEX" => Some(Exchange::Moex),
        "REAL_EXCHANGE_RTS" => Some(Exchange::Spbx),
        _ => None,
    }
}

fn map_instrument(
    class: TinkoffInstrumentClass,
    raw: TinkoffInstrument,
) -> Result<Option<Instrument>, DictionaryError> {
    let Some(exchange) = exchange_for(&raw.real_exchange) else {
        return Ok(None);
    };

    let min_price_increment = match &raw.min_price_increment {
        Some(quotation) => quotation.to_decimal().ok_or_else(|| {
            DictionaryError::parse(
                PROVIDER_ID,
                format!("Invalid minPriceIncrement for {}", raw.figi),
            )
        })?,
        None => rust_decimal::Decimal::ZERO,
    };

    let mut instrument = Instrument::new(
        space_separator(&raw.ticker, '.'),
        exchange,
        Broker::Tinkoff,
        raw.name,
        class.instrument_type(),
    )
    .with_min_price_increment(min_price_increment)
    .with_extension("tinkoffFigi", raw.figi)
    .with_extension("classCode", raw.class_code);

    instrument.currency = raw.currency.map(|c| c.to_uppercase());
    instrument.for_qual_investor_flag = raw.for_qual_investor_flag;
    instrument.lot = raw.lot;
    instrument.isin = raw.isin.filter(|isin| !isin.is_empty());

    Ok(Some(instrument))
}

/// Maps one class response. Instruments on other exchanges are dropped.
pub(crate) fn map_class(
    class: TinkoffInstrumentClass,
    body: &str,
) -> Result<Vec<Instrument>, DictionaryError> {
    let response: InstrumentsResponse = parse_json(PROVIDER_ID, body)?;

    let mut instruments = Vec::with_capacity(response.instruments.len());
    for raw in response.instruments {
        if let Some(instrument) = map_instrument(class, raw)? {
            instruments.push(instrument);
        }
    }
    Ok(instruments)
}

/// Applies the sub-call policy to one class result.
fn settle_class(
    policy: SubCallPolicy,
    class: TinkoffInstrumentClass,
    result: Result<Vec<Instrument>, DictionaryError>,
) -> Result<Vec<Instrument>, DictionaryError> {
    match result {
        Ok(instruments) => Ok(instruments),
        Err(e) if policy.absorbs(&e) => {
            warn!("Tinkoff: {} skipped: {}", class, e);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Tinkoff Invest instruments dictionary.
pub struct TinkoffProvider {
    client: SourceClient,
    base_url: String,
    classes: Vec<TinkoffInstrumentClass>,
}

impl TinkoffProvider {
    /// Lists shares only.
    pub fn new(client: SourceClient) -> Self {
        Self::with_classes(client, vec![TinkoffInstrumentClass::Shares])
    }

    pub fn with_classes(client: SourceClient, classes: Vec<TinkoffInstrumentClass>) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            classes,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn classes(&self) -> &[TinkoffInstrumentClass] {
        &self.classes
    }

    async fn fetch_class(
        &self,
        class: TinkoffInstrumentClass,
        token: &str,
    ) -> Result<Vec<Instrument>, DictionaryError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), class.method());
        let request = self
            .client
            .http()
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(APP_NAME_HEADER, APP_NAME)
            .json(&InstrumentsRequest::default());

        let body = self.client.send(PROVIDER_ID, request).await?;
        map_class(class, &body)
    }
}

#[async_trait]
impl DictionarySource for TinkoffProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn dictionary(&self) -> Dictionary {
        Dictionary::Tinkoff
    }

    fn sub_call_policy(&self) -> SubCallPolicy {
        SubCallPolicy::Tolerate
    }

    fn validate_params(&self, params: &DictionaryParams) -> Result<(), DictionaryError> {
        params.require_api_token().map(|_| ())
    }

    async fn fetch(&self, params: &DictionaryParams) -> Result<Vec<Instrument>, DictionaryError> {
        let token = params.require_api_token()?;
        let policy = self.sub_call_policy();

        let mut instruments = Vec::new();
        for &class in &self.classes {
            let result = self.fetch_class(class, token).await;
            let subset = settle_class(policy, class, result)?;
            debug!("Tinkoff: {} returned {} instruments", class, subset.len());
            instruments.extend(subset);
        }

        Ok(instruments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SHARES: &str = r#"{
        "instruments": [
            {
                "figi": "BBG004730N88",
                "ticker": "SBER",
                "classCode": "TQBR",
                "isin": "RU0009029540",
                "lot": 10,
                "currency": "rub",
                "name": "Сбер Банк",
                "minPriceIncrement": {"units": "0", "nano": 10000000},
                "realExchange": "REAL_EXCHANGE_MOEX",
                "forQualInvestorFlag": false
            },
            {
                "figi": "BBG000BCTLF6",
                "ticker": "BRK.B",
                "classCode": "SPBXM",
                "isin": "US0846707026",
                "lot": 1,
                "currency": "usd",
                "name": "Berkshire Hathaway",
                "minPriceIncrement": {"units": "0", "nano": 10000000},
                "realExchange": "REAL_EXCHANGE_RTS",
                "forQualInvestorFlag": true
            },
            {
                "figi": "TCS00A0JR4A1",
                "ticker": "OTCX",
                "classCode": "SPBRU",
                "lot": 1,
                "currency": "rub",
                "name": "Over the counter",
                "minPriceIncrement": {"units": "1", "nano": 500000000},
                "realExchange": "REAL_EXCHANGE_OTC"
            }
        ]
    }"#;

    #[test]
    fn test_maps_shares_and_filters_exchanges() {
        let instruments = map_class(TinkoffInstrumentClass::Shares, SHARES).unwrap();
        assert_eq!(instruments.len(), 2);

        let sber = &instruments[0];
        assert_eq!(sber.symbol, "SBER");
        assert_eq!(sber.exchange, Exchange::Moex);
        assert_eq!(sber.broker, Broker::Tinkoff);
        assert_eq!(sber.instrument_type, InstrumentType::Stock);
        assert_eq!(sber.min_price_increment, dec!(0.01));
        assert_eq!(sber.currency.as_deref(), Some("RUB"));
        assert_eq!(sber.lot, Some(10));
        assert_eq!(sber.isin.as_deref(), Some("RU0009029540"));
        assert_eq!(sber.extensions["tinkoffFigi"], "BBG004730N88");
        assert_eq!(sber.extensions["classCode"], "TQBR");
        assert!(!sber.for_qual_investor_flag);

        let brk = &instruments[1];
        assert_eq!(brk.symbol, "BRK B");
        assert_eq!(brk.exchange, Exchange::Spbx);
        assert!(brk.for_qual_investor_flag);
    }

    #[test]
    fn test_etfs_class_maps_to_etf() {
        let body = r#"{"instruments": [{"figi": "BBG333333333", "ticker": "TMOS", "classCode": "TQTF",
            "currency": "rub", "name": "Тинькофф iMOEX", "lot": 1,
            "minPriceIncrement": {"units": 0, "nano": 2000000}, "realExchange": "REAL_EXCHANGE_MOEX"}]}"#;
        let instruments = map_class(TinkoffInstrumentClass::Etfs, body).unwrap();
        assert_eq!(instruments[0].instrument_type, InstrumentType::Etf);
        assert_eq!(instruments[0].min_price_increment, dec!(0.002));
    }

    #[test]
    fn test_class_from_str() {
        assert_eq!(
            "Shares".parse::<TinkoffInstrumentClass>().unwrap(),
            TinkoffInstrumentClass::Shares
        );
        assert_eq!(
            " etfs ".parse::<TinkoffInstrumentClass>().unwrap(),
            TinkoffInstrumentClass::Etfs
        );
        assert!("Bonds".parse::<TinkoffInstrumentClass>().is_err());
    }

    #[test]
    fn test_tolerated_sub_call_failure_yields_empty_subset() {
        let network = Err(DictionaryError::Request {
            provider: PROVIDER_ID.to_string(),
            message: "connection reset".to_string(),
        });
        let subset =
            settle_class(SubCallPolicy::Tolerate, TinkoffInstrumentClass::Etfs, network).unwrap();
        assert!(subset.is_empty());

        let garbage = map_class(TinkoffInstrumentClass::Shares, "<html>");
        let subset =
            settle_class(SubCallPolicy::Tolerate, TinkoffInstrumentClass::Shares, garbage).unwrap();
        assert!(subset.is_empty());
    }

    #[test]
    fn test_http_status_stays_fatal() {
        let status = Err(DictionaryError::HttpStatus {
            provider: PROVIDER_ID.to_string(),
            status: 401,
            body: "unauthenticated".to_string(),
        });
        let result = settle_class(SubCallPolicy::Tolerate, TinkoffInstrumentClass::Shares, status);
        assert!(matches!(result, Err(DictionaryError::HttpStatus { status: 401, .. })));
    }

    #[test]
    fn test_missing_token_fails_validation() {
        let provider = TinkoffProvider::new(SourceClient::new());
        assert!(matches!(
            provider.validate_params(&DictionaryParams::default()),
            Err(DictionaryError::ValidationFailed { .. })
        ));
        assert!(provider
            .validate_params(&DictionaryParams::with_api_token("t.token"))
            .is_ok());
        assert_eq!(provider.classes(), &[TinkoffInstrumentClass::Shares]);
    }
}
