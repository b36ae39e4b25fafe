use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Currency that does not require a qualified-investor status on Russian venues.
pub const HOME_CURRENCY: &str = "RUB";

/// Exchanges an instrument can be listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Exchange {
    Binance,
    UtexMarginStocks,
    Us,
    Spbx,
    Moex,
    /// Umbrella for Russian venues (MOEX + SPBX); used as a cache target.
    Rus,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::UtexMarginStocks => "utex-margin-stocks",
            Self::Us => "us",
            Self::Spbx => "spbx",
            Self::Moex => "moex",
            Self::Rus => "rus",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binance" => Ok(Self::Binance),
            "utex-margin-stocks" => Ok(Self::UtexMarginStocks),
            "us" => Ok(Self::Us),
            "spbx" => Ok(Self::Spbx),
            "moex" => Ok(Self::Moex),
            "rus" => Ok(Self::Rus),
            other => Err(format!("Unknown exchange: {}", other)),
        }
    }
}

/// Brokers an instrument can be traded through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Broker {
    Binance,
    Utex,
    Psina,
    Alor,
    Tinkoff,
}

impl Broker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Utex => "utex",
            Self::Psina => "psina",
            Self::Alor => "alor",
            Self::Tinkoff => "tinkoff",
        }
    }
}

impl fmt::Display for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Broker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binance" => Ok(Self::Binance),
            "utex" => Ok(Self::Utex),
            "psina" => Ok(Self::Psina),
            "alor" => Ok(Self::Alor),
            "tinkoff" => Ok(Self::Tinkoff),
            other => Err(format!("Unknown broker: {}", other)),
        }
    }
}
