//! Audit event records and per-source timestamp handling

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Length of `YYYY-MM-DDTHH:MM:SS`
const SECOND_PREFIX_LEN: usize = 19;

/// Format used for every timestamp sent to the API or used as a cursor
pub const CURSOR_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Errors raised while interpreting a single record
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no '{0}' field")]
    MissingTimestamp(&'static str),
    #[error("record timestamp '{0}' is not an ISO-8601 UTC timestamp")]
    BadTimestamp(String),
}

/// Where a source keeps its event timestamp and how it is ordered.
///
/// The two policies are kept apart on purpose: changing either one changes
/// the granularity of deduplication for that source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// `date` field; records are ordered by the full timestamp string
    Legacy,
    /// `event.occurred_at` field; records are ordered by the second-truncated timestamp
    ///
    /// Records within the same second keep the order the API returned them in.
    Native,
}

impl TimestampPolicy {
    /// Dotted name of the timestamp field, for diagnostics
    pub fn field_name(&self) -> &'static str {
        match self {
            TimestampPolicy::Legacy => "date",
            TimestampPolicy::Native => "event.occurred_at",
        }
    }

    /// Locate the raw timestamp string inside a record
    pub fn extract<'a>(&self, value: &'a Value) -> Option<&'a str> {
        match self {
            TimestampPolicy::Legacy => value.get("date")?.as_str(),
            TimestampPolicy::Native => value.get("event")?.get("occurred_at")?.as_str(),
        }
    }

    fn sort_key(&self, raw: &str, prefix: &DateTime<Utc>) -> String {
        match self {
            TimestampPolicy::Legacy => raw.to_string(),
            TimestampPolicy::Native => format_cursor(prefix),
        }
    }
}

/// Truncate a raw timestamp to whole seconds and parse it as UTC
pub fn second_prefix(raw: &str) -> Option<DateTime<Utc>> {
    let head = raw.get(..SECOND_PREFIX_LEN)?;
    NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Render a timestamp the way the APIs and cursors expect it
pub fn format_cursor(ts: &DateTime<Utc>) -> String {
    ts.format(CURSOR_FORMAT).to_string()
}

/// A single audit event as harvested from the API or read back from disk
///
/// The record body is opaque; only its timestamp is interpreted. The
/// canonical serialization (compact JSON with sorted keys) is the record's
/// identity for deduplication and is exactly what gets written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    canonical: String,
    timestamp: String,
    prefix: DateTime<Utc>,
    sort_key: String,
}

impl EventRecord {
    /// Build a record from a decoded JSON value
    pub fn from_value(value: &Value, policy: TimestampPolicy) -> Result<Self, RecordError> {
        if !value.is_object() {
            return Err(RecordError::NotAnObject);
        }
        let raw = policy
            .extract(value)
            .ok_or(RecordError::MissingTimestamp(policy.field_name()))?;
        let prefix = second_prefix(raw).ok_or_else(|| RecordError::BadTimestamp(raw.to_string()))?;

        Ok(Self {
            canonical: serde_json::to_string(value)?,
            timestamp: raw.to_string(),
            sort_key: policy.sort_key(raw, &prefix),
            prefix,
        })
    }

    /// Parse one line of a log file
    pub fn from_line(line: &str, policy: TimestampPolicy) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(&value, policy)
    }

    /// Canonical serialized form (one log line, without the newline)
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Raw timestamp string as sent by the API
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Timestamp truncated to whole seconds
    pub fn prefix(&self) -> DateTime<Utc> {
        self.prefix
    }

    /// UTC calendar day the record belongs to
    pub fn day(&self) -> NaiveDate {
        self.prefix.date_naive()
    }

    /// Key used to order records within a day
    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }
}
