//! Deduplicating writer for day partitions

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use log::{debug, error};

use crate::error::{Operation, Result, SyncError};
use crate::models::{EventRecord, SourceKind};
use crate::storage::LogStore;

/// Statistics from one write
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Lines appended
    pub written: usize,
    /// Records skipped because they were already known or repeated in the batch
    pub duplicates: usize,
    /// Partitions appended to, ascending
    pub days: Vec<NaiveDate>,
}

/// Append a batch of records to their day partitions
///
/// Records whose canonical form is in `known`, or that repeat earlier in the
/// batch, are skipped. The rest are grouped by UTC day and appended in
/// ascending timestamp order; ties keep their batch order. Days are written
/// oldest first and the first failing append aborts the write.
pub fn write_records(
    store: &dyn LogStore,
    source: SourceKind,
    records: &[EventRecord],
    known: &HashSet<String>,
) -> Result<WriteOutcome> {
    let mut outcome = WriteOutcome::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    let mut by_day: BTreeMap<NaiveDate, Vec<&EventRecord>> = BTreeMap::new();

    for record in records {
        if known.contains(record.canonical()) || !seen.insert(record.canonical()) {
            outcome.duplicates += 1;
            continue;
        }
        by_day.entry(record.day()).or_default().push(record);
    }

    if outcome.duplicates > 0 {
        debug!("Skipped {} already stored {} records.", outcome.duplicates, source);
    }

    for (day, mut day_records) in by_day {
        day_records.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        let lines: Vec<String> = day_records
            .iter()
            .map(|r| r.canonical().to_string())
            .collect();

        let location = store.describe(day);
        if let Err(e) = store.append_lines(day, &lines) {
            error!("Error writing {} records to {}: {}", lines.len(), location, e);
            return Err(SyncError::new(Operation::AppendPartition, location, e));
        }

        debug!("Wrote {} records to {}.", lines.len(), location);
        outcome.written += lines.len();
        outcome.days.push(day);
    }

    Ok(outcome)
}
