//! Windowed catch-up for one source
//!
//! A pass walks from the checkpoint to "now" in bounded windows. Each window
//! is fetched in full, written, and only then does the start move forward,
//! so a failure leaves everything before the failing window on disk.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use log::{error, info};

use crate::api::EventFetcher;
use crate::config::Tuning;
use crate::error::{ErrorClass, SyncError};
use crate::models::{Cursor, EventRecord, FetchWindow, SourceKind};
use crate::storage::LogStore;
use crate::sync::checkpoint::Checkpoint;
use crate::sync::writer::write_records;
use crate::sync::{Clock, ShutdownFlag, utc_now};

/// How the next window's start is chosen after a non-empty window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Next window starts where this one ended
    WindowEnd,
    /// Next window starts `overlap` before the newest record, if that moves forward
    NewestRecord { overlap: Duration },
}

impl Advance {
    pub fn for_source(source: SourceKind, tuning: &Tuning) -> Self {
        if source.is_legacy() {
            Advance::WindowEnd
        } else {
            Advance::NewestRecord {
                overlap: tuning.org_overlap(),
            }
        }
    }

    fn next_start(&self, window: &FetchWindow, newest: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Advance::WindowEnd => window.ended_at,
            Advance::NewestRecord { overlap } => {
                let candidate = newest - *overlap;
                if candidate > window.started_at {
                    candidate
                } else {
                    window.ended_at
                }
            }
        }
    }
}

/// How a pass ended
#[derive(Debug)]
pub enum PassOutcome {
    /// The final window (ending at "now") was processed
    CaughtUp,
    /// A window failed; later windows were not attempted
    Aborted(SyncError),
    /// Shutdown was requested between windows
    Interrupted,
}

/// Statistics from one pass
#[derive(Debug)]
pub struct PassReport {
    pub source: SourceKind,
    pub windows: usize,
    pub fetched: usize,
    pub written: usize,
    pub duplicates: usize,
    pub outcome: PassOutcome,
    /// Newest cursor reached; carried into the next cycle
    pub cursor: Option<Cursor>,
}

impl PassReport {
    pub fn new(source: SourceKind, outcome: PassOutcome) -> Self {
        Self {
            source,
            windows: 0,
            fetched: 0,
            written: 0,
            duplicates: 0,
            outcome,
            cursor: None,
        }
    }

    pub fn is_caught_up(&self) -> bool {
        matches!(self.outcome, PassOutcome::CaughtUp)
    }

    /// Class of the error that aborted the pass
    pub fn error_class(&self) -> Option<ErrorClass> {
        match &self.outcome {
            PassOutcome::Aborted(e) => Some(e.class()),
            _ => None,
        }
    }
}

/// Drives the windows of one pass
pub struct WindowController<'a> {
    fetcher: &'a dyn EventFetcher,
    store: &'a dyn LogStore,
    clock: &'a dyn Clock,
    shutdown: &'a ShutdownFlag,
    utc_offset_hours: i32,
    max_window: Duration,
    overlap: Duration,
    advance: Advance,
}

impl<'a> WindowController<'a> {
    /// Create a controller with default limits and a UTC host clock
    pub fn new(
        fetcher: &'a dyn EventFetcher,
        store: &'a dyn LogStore,
        clock: &'a dyn Clock,
        shutdown: &'a ShutdownFlag,
    ) -> Self {
        let controller = Self {
            fetcher,
            store,
            clock,
            shutdown,
            utc_offset_hours: 0,
            max_window: Duration::zero(),
            overlap: Duration::zero(),
            advance: Advance::WindowEnd,
        };
        controller.with_tuning(&Tuning::default())
    }

    pub fn with_tuning(mut self, tuning: &Tuning) -> Self {
        let source = self.fetcher.source();
        self.max_window = tuning.max_window(source);
        self.overlap = if source.is_legacy() {
            tuning.overlap()
        } else {
            tuning.org_overlap()
        };
        self.advance = Advance::for_source(source, tuning);
        self
    }

    pub fn with_utc_offset(mut self, hours: i32) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    /// Run windows from the checkpoint until caught up, failed, or interrupted
    pub fn run(&self, checkpoint: Checkpoint) -> PassReport {
        let source = self.fetcher.source();
        let mut report = PassReport::new(source, PassOutcome::CaughtUp);

        let mut started_at = checkpoint.started_at;
        let mut cursor = checkpoint.cursor;
        // Records from the previous window that the next window may return again
        let mut boundary: HashSet<String> = HashSet::new();

        loop {
            if self.shutdown.is_requested() {
                info!("Shutdown requested. Stopping {} audit logs pass.", source);
                report.outcome = PassOutcome::Interrupted;
                break;
            }

            let now = utc_now(self.clock, self.utc_offset_hours);
            let (window, last) = FetchWindow::plan(started_at, now, self.max_window);
            report.windows += 1;
            info!("Start downloading data from {} audit logs from {}.", source, window);

            let records = match self.fetcher.fetch(&window) {
                Ok(records) => records,
                Err(e) => {
                    error!(
                        "Error occurred while receiving records from {} audit logs from {}. Aborting pass ({} error): {}",
                        source,
                        window,
                        e.class(),
                        e
                    );
                    report.outcome = PassOutcome::Aborted(e);
                    break;
                }
            };

            if records.is_empty() {
                info!("No records were received from {} audit logs from {}.", source, window);
                started_at = window.ended_at;
                boundary.clear();
            } else {
                info!(
                    "{} records were received from {} audit logs from {}.",
                    records.len(),
                    source,
                    window
                );
                report.fetched += records.len();

                let mut known = boundary;
                if let Some(c) = &cursor {
                    known.extend(c.cluster().iter().cloned());
                }

                match write_records(self.store, source, &records, &known) {
                    Ok(written) => {
                        report.written += written.written;
                        report.duplicates += written.duplicates;
                    }
                    Err(e) => {
                        error!(
                            "Error writing {} audit logs from {}. Aborting pass ({} error): {}",
                            source,
                            window,
                            e.class(),
                            e
                        );
                        report.outcome = PassOutcome::Aborted(e);
                        break;
                    }
                }

                if let Some(newest) = Cursor::from_records(source, &records) {
                    started_at = self.advance.next_start(&window, newest.prefix());
                    cursor = Some(newest);
                } else {
                    started_at = window.ended_at;
                }
                boundary = overlap_zone(&records, started_at - self.overlap);
            }

            if last {
                break;
            }
        }

        report.cursor = cursor;
        report
    }
}

/// Canonical forms of records at or after `from`
fn overlap_zone(records: &[EventRecord], from: DateTime<Utc>) -> HashSet<String> {
    records
        .iter()
        .filter(|r| r.prefix() >= from)
        .map(|r| r.canonical().to_string())
        .collect()
}
