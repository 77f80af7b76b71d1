//! In-memory sync position for one audit source

use chrono::{DateTime, Utc};

use super::{EventRecord, SourceKind};
use crate::models::record::format_cursor;

/// Tracks how far a source has been harvested
///
/// Holds the newest second-truncated timestamp seen and every record that
/// shares it (the "cluster"). The cluster doubles as the dedup set for the
/// next write, since the next fetch starts at that same second.
/// Lives only in process memory; it is rebuilt from disk after a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    /// Source this cursor belongs to
    pub source: SourceKind,
    prefix: DateTime<Utc>,
    cluster: Vec<String>,
}

impl Cursor {
    /// Create a cursor from an explicit prefix and cluster
    ///
    /// Duplicate cluster entries are dropped, first occurrence wins.
    pub fn new(source: SourceKind, prefix: DateTime<Utc>, cluster: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(cluster.len());
        for line in cluster {
            if !unique.contains(&line) {
                unique.push(line);
            }
        }
        Self {
            source,
            prefix,
            cluster: unique,
        }
    }

    /// Build the cursor for the newest second found in `records`
    ///
    /// Considers the whole result set, including records that were already
    /// known. Returns `None` for an empty slice.
    pub fn from_records(source: SourceKind, records: &[EventRecord]) -> Option<Self> {
        let newest = records.iter().map(EventRecord::prefix).max()?;

        let mut newest_records: Vec<&EventRecord> =
            records.iter().filter(|r| r.prefix() == newest).collect();
        newest_records.sort_by(|a, b| b.sort_key().cmp(a.sort_key()));

        let cluster = newest_records
            .into_iter()
            .map(|r| r.canonical().to_string())
            .collect();
        Some(Self::new(source, newest, cluster))
    }

    /// Newest second-truncated timestamp
    pub fn prefix(&self) -> DateTime<Utc> {
        self.prefix
    }

    /// Records sharing [`Cursor::prefix`], newest first
    pub fn cluster(&self) -> &[String] {
        &self.cluster
    }

    /// Whether a canonical record is already part of the cluster
    pub fn contains(&self, canonical: &str) -> bool {
        self.cluster.iter().any(|line| line == canonical)
    }

    pub fn is_empty(&self) -> bool {
        self.cluster.is_empty()
    }

    /// Prefix rendered as `YYYY-MM-DDTHH:MM:SSZ`
    pub fn prefix_string(&self) -> String {
        format_cursor(&self.prefix)
    }
}
