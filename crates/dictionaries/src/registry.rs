//! Dictionary registry.
//!
//! Maps each [`Dictionary`] to exactly one [`DictionarySource`] and runs the
//! shared pipeline around it:
//! 1. Validate operator input (no network)
//! 2. Fetch and map
//! 3. Normalize the batch (schema invariants, duplicate collapse)

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::DictionaryError;
use crate::models::{Dictionary, DictionaryParams, Instrument};
use crate::normalize::InstrumentValidator;
use crate::provider::alor::AlorSpbxProvider;
use crate::provider::binance::BinanceProvider;
use crate::provider::psina::PsinaUsStocksProvider;
use crate::provider::tinkoff::{TinkoffInstrumentClass, TinkoffProvider};
use crate::provider::utex::UtexMarginProvider;
use crate::provider::{DictionarySource, SourceClient};

/// Tagged dispatch from dictionary identifiers to adapters.
pub struct DictionaryRegistry {
    sources: HashMap<Dictionary, Arc<dyn DictionarySource>>,
    validator: InstrumentValidator,
}

impl DictionaryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::with_validator(InstrumentValidator::new())
    }

    pub fn with_validator(validator: InstrumentValidator) -> Self {
        Self {
            sources: HashMap::new(),
            validator,
        }
    }

    /// Registers the five built-in adapters sharing one HTTP client.
    pub fn with_defaults(
        client: SourceClient,
        tinkoff_classes: Vec<TinkoffInstrumentClass>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BinanceProvider::new(client.clone())));
        registry.register(Arc::new(UtexMarginProvider::new(client.clone())));
        registry.register(Arc::new(PsinaUsStocksProvider::new(client.clone())));
        registry.register(Arc::new(AlorSpbxProvider::new(client.clone())));
        registry.register(Arc::new(TinkoffProvider::with_classes(client, tinkoff_classes)));
        registry
    }

    /// Registers `source` for its dictionary, replacing any previous adapter.
    pub fn register(&mut self, source: Arc<dyn DictionarySource>) {
        let dictionary = source.dictionary();
        if self.sources.insert(dictionary, source).is_some() {
            warn!("Replacing source registered for dictionary '{}'", dictionary);
        }
    }

    pub fn source(
        &self,
        dictionary: Dictionary,
    ) -> Result<&Arc<dyn DictionarySource>, DictionaryError> {
        self.sources
            .get(&dictionary)
            .ok_or_else(|| DictionaryError::SourceNotRegistered(dictionary.to_string()))
    }

    /// Registered dictionaries in declaration order.
    pub fn dictionaries(&self) -> Vec<Dictionary> {
        Dictionary::ALL
            .into_iter()
            .filter(|d| self.sources.contains_key(d))
            .collect()
    }

    /// Checks operator input for `dictionary` without touching the network.
    pub fn validate(
        &self,
        dictionary: Dictionary,
        params: &DictionaryParams,
    ) -> Result<(), DictionaryError> {
        self.source(dictionary)?.validate_params(params)
    }

    /// Fetches `dictionary` and returns its normalized instrument list.
    pub async fn fetch(
        &self,
        dictionary: Dictionary,
        params: &DictionaryParams,
    ) -> Result<Vec<Instrument>, DictionaryError> {
        let source = self.source(dictionary)?;
        source.validate_params(params)?;

        let raw = source.fetch(params).await?;
        let fetched = raw.len();
        let (instruments, report) = self.validator.normalize_batch(raw);

        info!(
            "Dictionary '{}' via {}: fetched {}, accepted {}, rejected {}, fixed {}, duplicates {}",
            dictionary,
            source.id(),
            fetched,
            report.accepted,
            report.rejected,
            report.fixed,
            report.duplicates
        );

        Ok(instruments)
    }
}

impl Default for DictionaryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
