//! PPP Core - import pipeline domain, services, and traits.
//!
//! This crate sequences dictionary fetches into the remote instrument
//! collection and the local instrument cache. It is storage-agnostic and
//! defines traits that are implemented by the `storage-sqlite` and `connect`
//! crates.

pub mod errors;
pub mod instruments;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
