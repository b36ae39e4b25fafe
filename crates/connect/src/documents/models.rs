//! Wire types of the remote functions endpoint.

use ppp_core::instruments::UpsertSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /functions/bulkWrite`.
#[derive(Debug, Serialize)]
pub struct BulkWriteRequest<'a> {
    pub collection: &'a str,
    pub operations: Vec<BulkOperation<'a>>,
    pub options: BulkWriteOptions,
}

impl<'a> BulkWriteRequest<'a> {
    /// Unordered `updateOne` batch over `specs`.
    pub fn unordered(collection: &'a str, specs: &'a [UpsertSpec]) -> Self {
        Self {
            collection,
            operations: specs.iter().map(BulkOperation::UpdateOne).collect(),
            options: BulkWriteOptions { ordered: false },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BulkOperation<'a> {
    UpdateOne(&'a UpsertSpec),
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BulkWriteOptions {
    pub ordered: bool,
}

/// Body of `POST /functions/find`.
#[derive(Debug, Serialize)]
pub struct FindRequest<'a> {
    pub collection: &'a str,
    pub filter: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Replies
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWriteReply {
    #[serde(default)]
    pub matched_count: u64,
    #[serde(default)]
    pub modified_count: u64,
    #[serde(default)]
    pub upserted_count: u64,
    #[serde(default)]
    pub write_errors: Vec<WriteErrorDocument>,
}

#[derive(Debug, Deserialize)]
pub struct WriteErrorDocument {
    pub index: usize,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub errmsg: String,
}

/// Error body returned by the endpoint on a non-2xx status.
#[derive(Debug, Deserialize)]
pub(crate) struct RemoteErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Document id, plain or in extended JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Text(String),
    ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl DocumentId {
    pub fn into_string(self) -> String {
        match self {
            DocumentId::Text(id) => id,
            DocumentId::ObjectId { oid } => oid,
        }
    }
}

/// Timestamp, plain or in extended JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Text(String),
    Extended {
        #[serde(rename = "$date")]
        date: String,
    },
}

/// Stored broker profile document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(rename = "type")]
    pub broker_type: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateValue>,
    #[serde(default)]
    pub removed: Option<bool>,
}

/// The part of a stored instrument read back to recover the `removed`
/// flag. Every other field is ignored, whatever its shape.
#[derive(Debug, Deserialize)]
pub struct RemovedFlagDocument {
    pub symbol: String,
    #[serde(default)]
    pub removed: Option<Value>,
}

impl RemovedFlagDocument {
    pub fn is_removed(&self) -> bool {
        matches!(self.removed, Some(Value::Bool(true)))
    }
}
