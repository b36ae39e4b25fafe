//! Database models for the instrument cache.

use diesel::prelude::*;
use ppp_core::instruments::VERSION_MARKER_SYMBOL;
use ppp_dictionaries::Instrument;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;

/// One cache row; `document` is the instrument serialized as JSON.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::instrument_cache_rows)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InstrumentCacheRowDB {
    pub store: String,
    pub symbol: String,
    pub document: String,
    pub updated_at: String,
}

impl InstrumentCacheRowDB {
    pub fn from_instrument(
        store: &str,
        instrument: &Instrument,
        updated_at: &str,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            store: store.to_string(),
            symbol: instrument.symbol.clone(),
            document: serde_json::to_string(instrument)?,
            updated_at: updated_at.to_string(),
        })
    }

    pub fn version_marker(
        store: &str,
        version: i64,
        updated_at: &str,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            store: store.to_string(),
            symbol: VERSION_MARKER_SYMBOL.to_string(),
            document: serde_json::to_string(&VersionMarkerDocument { version })?,
            updated_at: updated_at.to_string(),
        })
    }

    pub fn is_version_marker(&self) -> bool {
        self.symbol == VERSION_MARKER_SYMBOL
    }
}

/// Payload of the `@version` row.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionMarkerDocument {
    pub version: i64,
}

/// Allocator counter of one store.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::instrument_cache_versions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CacheVersionDB {
    pub store: String,
    pub version: i64,
    pub updated_at: String,
}
