//! Conversion of remote replies into core types.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::warn;
use ppp_core::instruments::{BrokerProfile, BulkWriteIssue, BulkWriteSummary};
use ppp_dictionaries::Broker;
use serde_json::Value;

use super::models::{BrokerDocument, BulkWriteReply, DateValue, RemovedFlagDocument};

pub fn summary_from_reply(reply: BulkWriteReply) -> BulkWriteSummary {
    BulkWriteSummary {
        matched: reply.matched_count,
        modified: reply.modified_count,
        upserted: reply.upserted_count,
        errors: reply
            .write_errors
            .into_iter()
            .map(|e| BulkWriteIssue {
                index: e.index,
                message: match e.code {
                    Some(code) => format!("{} (code {})", e.errmsg, code),
                    None => e.errmsg,
                },
            })
            .collect(),
    }
}

/// Symbols flagged `removed: true` among stored instrument documents.
///
/// Documents without a string `symbol` are skipped. Other fields are not
/// validated, so records written by older clients still count.
pub fn removed_symbols_from_documents(documents: Vec<Value>) -> HashSet<String> {
    let mut removed = HashSet::new();
    for document in documents {
        match serde_json::from_value::<RemovedFlagDocument>(document) {
            Ok(doc) if doc.is_removed() => {
                removed.insert(doc.symbol);
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping instrument document without a symbol: {}", e),
        }
    }
    removed
}

fn parse_timestamp(value: DateValue) -> Option<DateTime<Utc>> {
    let raw = match value {
        DateValue::Text(s) => s,
        DateValue::Extended { date } => date,
    };
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Maps a broker document, dropping removed ones and ones of another broker.
pub fn profile_from_document(document: BrokerDocument, broker: Broker) -> Option<BrokerProfile> {
    if document.removed == Some(true) || document.broker_type != broker.as_str() {
        return None;
    }

    Some(BrokerProfile {
        id: document.id.into_string(),
        broker,
        api_token: document.api_token,
        updated_at: document.updated_at.and_then(parse_timestamp),
    })
}

/// Most recently updated first; profiles without a timestamp go last.
pub fn sort_profiles(profiles: &mut [BrokerProfile]) {
    profiles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::models::WriteErrorDocument;
    use serde_json::json;

    #[test]
    fn test_summary_keeps_write_error_indices() {
        let reply = BulkWriteReply {
            matched_count: 3,
            modified_count: 1,
            upserted_count: 2,
            write_errors: vec![WriteErrorDocument {
                index: 4,
                code: Some(11000),
                errmsg: "duplicate key".to_string(),
            }],
        };

        let summary = summary_from_reply(reply);
        assert_eq!(summary.matched, 3);
        assert_eq!(summary.upserted, 2);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].index, 4);
        assert_eq!(summary.errors[0].message, "duplicate key (code 11000)");
    }

    #[test]
    fn test_removed_symbols_read_off_schema_documents() {
        let documents = vec![
            json!({
                "_id": {"$oid": "64f1c0ffee"},
                "symbol": "AAPL",
                "exchange": "utex",
                "broker": "utex",
                "lot": 0.5,
                "removed": true
            }),
            json!({"symbol": "TSLA", "lot": 1.0, "minPriceIncrement": "0.01", "removed": true}),
            json!({"symbol": "MSFT", "removed": false}),
            json!({"symbol": "NVDA", "removed": "true"}),
            json!({"symbol": "AMZN"}),
            json!({"removed": true}),
            json!({"symbol": 42, "removed": true}),
        ];

        let removed = removed_symbols_from_documents(documents);
        let mut symbols: Vec<&str> = removed.iter().map(String::as_str).collect();
        symbols.sort();
        assert_eq!(symbols, vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn test_profiles_filtered_and_sorted() {
        let documents: Vec<BrokerDocument> = serde_json::from_value(json!([
            {"_id": "old", "type": "tinkoff", "apiToken": "t-1", "updatedAt": "2024-01-01T00:00:00Z"},
            {"_id": {"$oid": "new"}, "type": "tinkoff", "apiToken": "t-2", "updatedAt": {"$date": "2025-06-01T00:00:00Z"}},
            {"_id": "gone", "type": "tinkoff", "apiToken": "t-3", "removed": true},
            {"_id": "alor", "type": "alor", "apiToken": "t-4"}
        ]))
        .unwrap();

        let mut profiles: Vec<BrokerProfile> = documents
            .into_iter()
            .filter_map(|d| profile_from_document(d, Broker::Tinkoff))
            .collect();
        sort_profiles(&mut profiles);

        let ids: Vec<&str> = profiles.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(profiles[0].api_token.as_deref(), Some("t-2"));
    }
}
