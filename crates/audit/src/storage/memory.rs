//! In-memory storage implementation
//!
//! Used by tests in place of a directory of day files.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io;
use std::sync::RwLock;

use super::LogStore;

/// In-memory implementation of LogStore
pub struct InMemoryLogStore {
    name: String,
    partitions: RwLock<BTreeMap<NaiveDate, Vec<String>>>,
}

impl InMemoryLogStore {
    /// Create a new empty store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Lines of a day's partition
    pub fn lines(&self, day: NaiveDate) -> Vec<String> {
        self.partitions
            .read()
            .unwrap()
            .get(&day)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of lines across all partitions
    pub fn line_count(&self) -> usize {
        self.partitions.read().unwrap().values().map(Vec::len).sum()
    }
}

impl Default for InMemoryLogStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl LogStore for InMemoryLogStore {
    fn list_days(&self) -> io::Result<Vec<NaiveDate>> {
        Ok(self.partitions.read().unwrap().keys().rev().copied().collect())
    }

    fn read_lines(&self, day: NaiveDate) -> io::Result<Vec<String>> {
        Ok(self
            .lines(day)
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect())
    }

    fn append_lines(&self, day: NaiveDate, lines: &[String]) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        self.partitions
            .write()
            .unwrap()
            .entry(day)
            .or_default()
            .extend(lines.iter().cloned());
        Ok(())
    }

    fn describe(&self, day: NaiveDate) -> String {
        format!("{}:{}", self.name, day)
    }
}
