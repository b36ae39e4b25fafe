//! PPP Instrument Dictionaries Crate
//!
//! This crate fetches raw instrument lists from broker and exchange APIs
//! ("dictionaries") and maps them into one canonical [`Instrument`] record.
//!
//! # Overview
//!
//! Five dictionaries are supported:
//! - Binance spot exchange info
//! - UTEX margin stocks
//! - Psina US stocks (operator-supplied URL)
//! - Alor SPB Exchange securities
//! - Tinkoff Invest instruments (requires an API token)
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +--------------------+
//! |    Dictionary    | --> | DictionaryRegistry |  (tagged dispatch)
//! +------------------+     +--------------------+
//!                                    |
//!                                    v
//!                          +--------------------+
//!                          |  DictionarySource  |  (Binance, UTEX, Psina, Alor, Tinkoff)
//!                          +--------------------+
//!                                    |
//!                                    v
//!                          +--------------------+
//!                          | InstrumentValidator|  (schema invariants, dedup)
//!                          +--------------------+
//!                                    |
//!                                    v
//!                          +--------------------+
//!                          |     Instrument     |  (canonical record)
//!                          +--------------------+
//! ```

pub mod errors;
pub mod models;
pub mod normalize;
pub mod provider;
pub mod registry;

pub use errors::{DictionaryError, FailureKind, SubCallPolicy};

pub use models::{
    Broker, Dictionary, DictionaryParams, Exchange, Instrument, InstrumentKey, InstrumentType,
    HOME_CURRENCY,
};

pub use normalize::{InstrumentValidator, NormalizationReport, ValidatorConfig};

pub use provider::alor::AlorSpbxProvider;
pub use provider::binance::BinanceProvider;
pub use provider::psina::PsinaUsStocksProvider;
pub use provider::tinkoff::{TinkoffInstrumentClass, TinkoffProvider};
pub use provider::utex::UtexMarginProvider;
pub use provider::{DictionarySource, SourceClient};

pub use registry::DictionaryRegistry;
