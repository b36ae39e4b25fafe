//! Dictionary source abstractions and implementations.
//!
//! This module contains:
//! - The `DictionarySource` trait that all adapters implement
//! - The shared `SourceClient` (timeouts, optional fetch relay, status handling)
//! - One adapter per dictionary
//!
//! Adapters only read from the network and map payloads. Writing the result
//! anywhere is the job of the import orchestrator in `ppp-core`.

mod http;
mod traits;

pub mod alor;
pub mod binance;
pub mod psina;
pub mod tinkoff;
pub mod utex;

pub use http::{SourceClient, DEFAULT_TIMEOUT_SECS};
pub use traits::DictionarySource;
