//! SQLite storage for the PPP instrument cache.
//!
//! Implements the cache traits defined in `ppp-core`:
//! - Database connection pooling and the single writer actor
//! - Diesel migrations
//! - One keyed store per `(exchange, broker)` cache target, with its version marker
//! - The per-store version allocator
//!
//! ```text
//! core (import pipeline)
//!          │
//!          ▼
//!  storage-sqlite (this crate)
//!          │
//!          ▼
//!      SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

pub mod instrument_cache;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use instrument_cache::{CacheVersionRepository, InstrumentCacheRepository};

pub use ppp_core::errors::{DatabaseError, Error, Result};
