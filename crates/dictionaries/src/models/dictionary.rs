use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::errors::DictionaryError;

/// Named external instrument-list sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dictionary {
    Binance,
    UtexMarginStocks,
    PsinaUsStocks,
    AlorSpbx,
    Tinkoff,
}

impl Dictionary {
    pub const ALL: [Dictionary; 5] = [
        Dictionary::Binance,
        Dictionary::UtexMarginStocks,
        Dictionary::PsinaUsStocks,
        Dictionary::AlorSpbx,
        Dictionary::Tinkoff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::UtexMarginStocks => "utex-margin-stocks",
            Self::PsinaUsStocks => "psina-us-stocks",
            Self::AlorSpbx => "alor-spbx",
            Self::Tinkoff => "tinkoff",
        }
    }

    /// Human-readable label shown to the operator.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Binance => "Binance",
            Self::UtexMarginStocks => "UTEX Margin (stocks)",
            Self::PsinaUsStocks => "US stocks (Psina)",
            Self::AlorSpbx => "Alor (SPB Exchange)",
            Self::Tinkoff => "Tinkoff",
        }
    }

    pub fn requires_url(&self) -> bool {
        matches!(self, Self::PsinaUsStocks)
    }

    pub fn requires_credential(&self) -> bool {
        matches!(self, Self::Tinkoff)
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dictionary {
    type Err = DictionaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| DictionaryError::UnknownDictionary(s.to_string()))
    }
}

/// Operator-supplied inputs for a single fetch.
#[derive(Debug, Clone, Default)]
pub struct DictionaryParams {
    /// Dictionary URL (Psina).
    pub url: Option<String>,
    /// Resolved API token (Tinkoff).
    pub api_token: Option<String>,
}

impl DictionaryParams {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            api_token: None,
        }
    }

    pub fn with_api_token(token: impl Into<String>) -> Self {
        Self {
            url: None,
            api_token: Some(token.into()),
        }
    }

    /// Returns the dictionary URL, failing when it is missing, blank or not absolute.
    pub fn require_url(&self) -> Result<Url, DictionaryError> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| DictionaryError::validation("Dictionary URL is required"))?;

        Url::parse(raw)
            .map_err(|e| DictionaryError::validation(format!("Invalid dictionary URL: {}", e)))
    }

    /// Returns the API token, failing when it is missing or blank.
    pub fn require_api_token(&self) -> Result<&str, DictionaryError> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DictionaryError::validation("Broker API token is required"))
    }
}
