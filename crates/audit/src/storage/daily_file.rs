//! File-based day-partitioned log storage

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::LogStore;

/// Directory of newline-delimited JSON files, one per day
///
/// Directory structure:
/// ```text
/// <dir>/
///   mail_audit_2024-03-01.json
///   mail_audit_2024-03-02.json
/// ```
/// Files that do not match `<base_name>_YYYY-MM-DD.<extension>` exactly are
/// ignored.
pub struct DailyFileStore {
    dir: PathBuf,
    base_name: String,
    extension: String,
}

impl DailyFileStore {
    pub fn new(dir: impl AsRef<Path>, base_name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            base_name: base_name.into(),
            extension: extension.into(),
        }
    }

    /// Path of the partition for a day
    pub fn partition_path(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.{}",
            self.base_name,
            day.format("%Y-%m-%d"),
            self.extension
        ))
    }

    /// Extract the day from a partition file name
    fn parse_file_name(&self, name: &str) -> Option<NaiveDate> {
        let date = name
            .strip_prefix(self.base_name.as_str())?
            .strip_prefix('_')?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;

        let well_formed = date.len() == 10
            && date
                .bytes()
                .enumerate()
                .all(|(i, b)| if i == 4 || i == 7 { b == b'-' } else { b.is_ascii_digit() });
        if !well_formed {
            return None;
        }
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }
}

impl LogStore for DailyFileStore {
    fn list_days(&self) -> io::Result<Vec<NaiveDate>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut days = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(day) = entry.file_name().to_str().and_then(|n| self.parse_file_name(n)) {
                days.push(day);
            }
        }

        days.sort_unstable_by(|a, b| b.cmp(a));
        Ok(days)
    }

    fn read_lines(&self, day: NaiveDate) -> io::Result<Vec<String>> {
        let bytes = match fs::read(self.partition_path(day)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        // Lossy decoding keeps a partially written line from hiding the rest of the file.
        Ok(bytes
            .split(|b| *b == b'\n')
            .map(|line| String::from_utf8_lossy(line).trim_end_matches('\r').to_string())
            .filter(|line| !line.trim().is_empty())
            .collect())
    }

    fn append_lines(&self, day: NaiveDate, lines: &[String]) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(self.partition_path(day))?;

        // Terminate a line left unfinished by an interrupted write.
        let needs_newline = if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            last[0] != b'\n'
        } else {
            false
        };

        let mut writer = BufWriter::new(&mut file);
        if needs_newline {
            writer.write_all(b"\n")?;
        }
        for line in lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        drop(writer);

        file.sync_data()
    }

    fn describe(&self, day: NaiveDate) -> String {
        self.partition_path(day).display().to_string()
    }
}
