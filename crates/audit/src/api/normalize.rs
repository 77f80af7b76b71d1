//! Normalization of API payloads into [`EventRecord`]s

use log::error;
use serde_json::Value;

use crate::error::{Cause, Operation, SyncError};
use crate::models::{EventRecord, SourceKind};

/// Convert one page of raw events, dropping records without a usable timestamp
pub fn normalize_events(source: SourceKind, events: Vec<Value>) -> Vec<EventRecord> {
    let policy = source.timestamp_policy();
    events
        .into_iter()
        .filter_map(|value| match EventRecord::from_value(&value, policy) {
            Ok(record) => Some(record),
            Err(e) => {
                let err = SyncError::new(Operation::FetchPage, source.label(), Cause::Malformed(e.to_string()));
                error!("Dropping {} record ({} error): {}. Record: {}", source, err.class(), err, value);
                None
            }
        })
        .collect()
}

/// Sort records newest first
pub fn sort_newest_first(records: &mut [EventRecord]) {
    records.sort_by(|a, b| b.sort_key().cmp(a.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_drops_bad_records() {
        let events = vec![
            json!({"date": "2024-03-01T10:00:00.000001Z", "id": 1}),
            json!({"id": 2}),
            json!("not an object"),
            json!({"date": "2024-03-01T09:00:00Z", "id": 3}),
        ];

        let records = normalize_events(SourceKind::Mail, events);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_sort_newest_first() {
        let mut records = normalize_events(
            SourceKind::Organization,
            vec![
                json!({"event": {"occurred_at": "2024-03-01T09:00:00Z"}}),
                json!({"event": {"occurred_at": "2024-03-01T11:00:00Z"}}),
                json!({"event": {"occurred_at": "2024-03-01T10:00:00Z"}}),
            ],
        );
        sort_newest_first(&mut records);

        let order: Vec<&str> = records.iter().map(|r| r.timestamp()).collect();
        assert_eq!(
            order,
            vec![
                "2024-03-01T11:00:00Z",
                "2024-03-01T10:00:00Z",
                "2024-03-01T09:00:00Z"
            ]
        );
    }

    #[test]
    fn test_native_order_within_second_is_arrival_order() {
        let mut records = normalize_events(
            SourceKind::Organization,
            vec![
                json!({"event": {"occurred_at": "2024-03-01T09:00:00.100Z"}, "n": 1}),
                json!({"event": {"occurred_at": "2024-03-01T09:00:00.900Z"}, "n": 2}),
                json!({"event": {"occurred_at": "2024-03-01T09:00:00.500Z"}, "n": 3}),
            ],
        );
        sort_newest_first(&mut records);

        let order: Vec<&str> = records.iter().map(|r| r.timestamp()).collect();
        assert_eq!(
            order,
            vec![
                "2024-03-01T09:00:00.100Z",
                "2024-03-01T09:00:00.900Z",
                "2024-03-01T09:00:00.500Z"
            ]
        );
    }
}
