//! Dictionary models
//!
//! This module contains the core data types:
//! - `types` - Exchange and broker enums
//! - `instrument` - Canonical instrument record (Instrument) and its identity key
//! - `dictionary` - Dictionary identifiers and operator-supplied fetch parameters

mod dictionary;
mod instrument;
mod types;

pub use dictionary::{Dictionary, DictionaryParams};
pub use instrument::{Instrument, InstrumentKey, InstrumentType};
pub use types::{Broker, Exchange, HOME_CURRENCY};
