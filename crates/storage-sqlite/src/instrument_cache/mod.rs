//! SQLite storage implementation for the instrument cache.

mod model;
mod repository;

pub use model::{CacheVersionDB, InstrumentCacheRowDB, VersionMarkerDocument};
pub use repository::{CacheVersionRepository, InstrumentCacheRepository, SqliteCacheHandle};
