//! Resume point resolution
//!
//! Decides where a source's next pass starts: the in-memory cursor if the
//! process has one, otherwise the newest second found in the day files,
//! otherwise the lookback bound.

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};

use crate::error::{Operation, Result, SyncError};
use crate::models::{Cursor, EventRecord, SourceKind};
use crate::storage::LogStore;
use crate::sync::lookback_start;

/// Where a checkpoint came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointOrigin {
    /// Cursor left by the previous cycle of this process
    Memory,
    /// Newest parseable record of a day partition
    Disk { day: NaiveDate },
    /// Nothing stored yet; start at the lookback bound
    Lookback,
}

/// Resume point for one pass
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// Lower bound of the first window
    pub started_at: DateTime<Utc>,
    /// Records already stored at `started_at`, used for dedup
    pub cursor: Option<Cursor>,
    pub origin: CheckpointOrigin,
}

impl Checkpoint {
    fn from_cursor(cursor: Cursor, origin: CheckpointOrigin) -> Self {
        Self {
            started_at: cursor.prefix(),
            cursor: Some(cursor),
            origin,
        }
    }
}

/// Resolve the resume point for a source
///
/// A memory cursor with a non-empty cluster wins. Otherwise day partitions
/// are scanned newest first; a partition without a single parseable record
/// is skipped in favor of the previous day. Malformed lines are logged and
/// skipped. A partition that cannot be read aborts resolution.
pub fn resolve_checkpoint(
    source: SourceKind,
    store: &dyn LogStore,
    memory: Option<&Cursor>,
    now: DateTime<Utc>,
    lookback_days: u32,
) -> Result<Checkpoint> {
    if let Some(cursor) = memory.filter(|c| !c.is_empty()) {
        debug!(
            "Resuming {} audit logs from in-memory cursor {} ({} records).",
            source,
            cursor.prefix_string(),
            cursor.cluster().len()
        );
        return Ok(Checkpoint::from_cursor(cursor.clone(), CheckpointOrigin::Memory));
    }

    let days = store.list_days().map_err(|e| {
        SyncError::new(Operation::ResolveCheckpoint, format!("{} partitions", source), e)
    })?;

    for day in days {
        let location = store.describe(day);
        let lines = store
            .read_lines(day)
            .map_err(|e| SyncError::new(Operation::ReadPartition, location.clone(), e))?;

        match newest_cluster(source, &lines, &location) {
            Some(cursor) => {
                info!(
                    "Last record in {} has timestamp {} ({} records in that second).",
                    location,
                    cursor.prefix_string(),
                    cursor.cluster().len()
                );
                return Ok(Checkpoint::from_cursor(cursor, CheckpointOrigin::Disk { day }));
            }
            None => debug!("No records found in {}. Selecting previous file.", location),
        }
    }

    let started_at = lookback_start(now, lookback_days);
    info!(
        "No stored {} audit logs found. Starting {} days back at {}.",
        source,
        lookback_days,
        started_at.format("%Y-%m-%dT%H:%M:%SZ")
    );
    Ok(Checkpoint {
        started_at,
        cursor: None,
        origin: CheckpointOrigin::Lookback,
    })
}

/// Walk a partition backward and collect the records of its newest second
///
/// The cluster ends at the first parseable record with a different second.
fn newest_cluster(source: SourceKind, lines: &[String], location: &str) -> Option<Cursor> {
    let policy = source.timestamp_policy();
    let mut prefix = None;
    let mut cluster = Vec::new();

    for line in lines.iter().rev() {
        let record = match EventRecord::from_line(line, policy) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed line in {}: {}", location, e);
                continue;
            }
        };

        match prefix {
            None => prefix = Some(record.prefix()),
            Some(p) if p != record.prefix() => break,
            Some(_) => {}
        }
        cluster.push(record.canonical().to_string());
    }

    prefix.map(|p| Cursor::new(source, p, cluster))
}
