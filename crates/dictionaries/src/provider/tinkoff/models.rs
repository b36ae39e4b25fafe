//! Tinkoff Invest REST gateway payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of every `InstrumentsService/<Class>` call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentsRequest {
    pub instrument_status: &'static str,
}

impl Default for InstrumentsRequest {
    fn default() -> Self {
        Self {
            instrument_status: "INSTRUMENT_STATUS_UNSPECIFIED",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InstrumentsResponse {
    #[serde(default)]
    pub instruments: Vec<TinkoffInstrument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TinkoffInstrument {
    pub figi: String,
    pub ticker: String,
    #[serde(default)]
    pub class_code: String,
    #[serde(default)]
    pub isin: Option<String>,
    #[serde(default)]
    pub lot: Option<u32>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub min_price_increment: Option<Quotation>,
    #[serde(default)]
    pub real_exchange: String,
    #[serde(default)]
    pub for_qual_investor_flag: bool,
}

/// 64-bit integers are encoded as JSON strings by the gRPC gateway, but
/// some mirrors emit plain numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Int64 {
    Number(i64),
    Text(String),
}

impl Int64 {
    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl Default for Int64 {
    fn default() -> Self {
        Self::Number(0)
    }
}

/// Fixed-point number: `units + nano / 1e9`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Quotation {
    #[serde(default)]
    pub units: Int64,
    #[serde(default)]
    pub nano: i32,
}

impl Quotation {
    pub fn to_decimal(&self) -> Option<Decimal> {
        let units = self.units.value()?;
        Some((Decimal::from(units) + Decimal::new(i64::from(self.nano), 9)).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quotation_string_units() {
        let q: Quotation = serde_json::from_str(r#"{"units": "114", "nano": 250000000}"#).unwrap();
        assert_eq!(q.to_decimal(), Some(dec!(114.25)));
    }

    #[test]
    fn test_quotation_numeric_units_and_defaults() {
        let q: Quotation = serde_json::from_str(r#"{"nano": 10000000}"#).unwrap();
        assert_eq!(q.to_decimal(), Some(dec!(0.01)));

        let q: Quotation = serde_json::from_str(r#"{"units": 3}"#).unwrap();
        assert_eq!(q.to_decimal(), Some(dec!(3)));
    }

    #[test]
    fn test_quotation_garbage_units() {
        let q: Quotation = serde_json::from_str(r#"{"units": "x", "nano": 1}"#).unwrap();
        assert_eq!(q.to_decimal(), None);
    }

    #[test]
    fn test_request_body() {
        assert_eq!(
            serde_json::to_string(&InstrumentsRequest::default()).unwrap(),
            r#"{"instrumentStatus":"INSTRUMENT_STATUS_UNSPECIFIED"}"#
        );
    }
}
