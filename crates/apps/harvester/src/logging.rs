//! Logging backend for the harvester
//!
//! Routes every `log` record to two sinks: the console through `env_logger`
//! (info and above unless `RUST_LOG` says otherwise) and a size-rotating file
//! that keeps debug detail for later inspection.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use anyhow::{Context, Result};
use log::{LevelFilter, Log, Metadata, Record};

/// Rotate the log file once it would grow past this size
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
/// Rotated files kept next to the active one
pub const LOG_BACKUPS: usize = 10;

/// Global storage for the harvester logger
static LOGGER: OnceLock<HarvesterLogger> = OnceLock::new();

/// Append-only file that rolls over to `<path>.1`, `<path>.2`, ...
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: impl AsRef<Path>, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_bytes,
            backups,
            file,
            written,
        })
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64 + 1;
        if self.written > 0 && self.written + len > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.written += len;
        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backups == 0 {
            self.file = File::create(&self.path)?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.backup_path(self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))?;

        self.file = open_append(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// `YYYY-MM-DD HH:MM:SS.mmm LEVEL:\tmessage`
fn format_line(record: &Record) -> String {
    format!(
        "{} {}:\t{}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.args()
    )
}

/// Console plus rotating file logger
struct HarvesterLogger {
    console: env_logger::Logger,
    file: Option<Mutex<RotatingFile>>,
    file_level: LevelFilter,
}

impl HarvesterLogger {
    fn file_enabled(&self, metadata: &Metadata) -> bool {
        self.file.is_some() && metadata.level() <= self.file_level
    }
}

impl Log for HarvesterLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || self.file_enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.console.matches(record) {
            self.console.log(record);
        }

        if !self.file_enabled(record.metadata()) {
            return;
        }
        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                // A failing log file must not take the harvester down
                let _ = guard.write_line(&format_line(record));
            }
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                let _ = guard.file.flush();
            }
        }
    }
}

/// Install the harvester logger as the global logger
///
/// Without a `log_file` only the console sink is active.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    let console = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .build();

    let file = log_file
        .map(|path| {
            RotatingFile::open(path, MAX_LOG_BYTES, LOG_BACKUPS)
                .with_context(|| format!("Failed to open log file: {}", path.display()))
        })
        .transpose()?;

    let file_level = LevelFilter::Debug;
    let max_level = if file.is_some() {
        console.filter().max(file_level)
    } else {
        console.filter()
    };

    let logger = LOGGER.get_or_init(|| HarvesterLogger {
        console,
        file: file.map(Mutex::new),
        file_level,
    });
    log::set_logger(logger).context("A logger was already installed")?;
    log::set_max_level(max_level);
    Ok(())
}
