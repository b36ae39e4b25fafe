//! Document shapes exchanged with the remote functions endpoint.

pub mod mapping;
mod models;

pub use models::*;
