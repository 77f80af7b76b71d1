//! Storage trait definitions

use chrono::NaiveDate;
use std::io;

/// Day-partitioned, append-only log of one source
///
/// Each partition holds newline-delimited records for one UTC calendar day.
/// Partitions are only ever created or appended to, never rewritten.
/// Only one process may write to a store at a time; nothing here locks.
pub trait LogStore: Send + Sync {
    /// Days that have a partition, newest first
    fn list_days(&self) -> io::Result<Vec<NaiveDate>>;

    /// Every non-blank line of a day's partition, in file order
    ///
    /// A missing partition reads as empty.
    fn read_lines(&self, day: NaiveDate) -> io::Result<Vec<String>>;

    /// Append lines to a day's partition, creating it if needed
    ///
    /// Lines must not contain newlines. Data is flushed before returning.
    fn append_lines(&self, day: NaiveDate, lines: &[String]) -> io::Result<()>;

    /// Human-readable location of a partition, for logs
    fn describe(&self, day: NaiveDate) -> String;
}
