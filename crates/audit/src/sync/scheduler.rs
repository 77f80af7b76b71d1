//! Polling loop over all configured sources

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::api::{SourceFetcher, Transport};
use crate::config::{Settings, SourceSettings};
use crate::models::{Cursor, SourceKind};
use crate::storage::DailyFileStore;
use crate::sync::checkpoint::resolve_checkpoint;
use crate::sync::window::{PassOutcome, PassReport, WindowController};
use crate::sync::{Clock, ShutdownFlag, utc_now};

/// Granularity of the interruptible sleep between cycles
const SLEEP_STEP: Duration = Duration::from_secs(1);

/// Runs one pass per source per cycle, then sleeps for the poll interval
///
/// Sources are processed one after another in configuration order. A failing
/// source is logged and skipped until the next cycle. Cursors are kept in
/// memory only; after a restart they are rebuilt from the day files.
pub struct Scheduler {
    settings: Settings,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    shutdown: ShutdownFlag,
    cursors: HashMap<SourceKind, Cursor>,
}

impl Scheduler {
    pub fn new(
        settings: Settings,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            settings,
            transport,
            clock,
            shutdown,
            cursors: HashMap::new(),
        }
    }

    /// In-memory cursor of a source, if a pass produced one
    pub fn cursor(&self, kind: SourceKind) -> Option<&Cursor> {
        self.cursors.get(&kind)
    }

    /// Run one pass for every configured source
    pub fn run_cycle(&mut self) -> Vec<PassReport> {
        let sources = self.settings.sources.clone();
        let mut reports = Vec::with_capacity(sources.len());

        for source in &sources {
            if self.shutdown.is_requested() {
                break;
            }

            let report = self.run_source(source);
            log_report(&report);

            if let Some(cursor) = report.cursor.clone().filter(|c| !c.is_empty()) {
                self.cursors.insert(source.kind, cursor);
            }
            reports.push(report);
        }

        reports
    }

    /// Cycle until shutdown is requested
    pub fn run_forever(&mut self) {
        loop {
            self.run_cycle();
            if self.shutdown.is_requested() || !self.sleep_between_cycles() {
                break;
            }
        }
        info!("Shutdown requested. Harvester stopped.");
    }

    fn run_source(&self, source: &SourceSettings) -> PassReport {
        let store = DailyFileStore::new(&source.dir, source.base_name.as_str(), self.settings.extension.as_str());
        let fetcher = SourceFetcher::for_source(
            source.kind,
            &self.settings,
            self.transport.clone(),
            self.clock.clone(),
        );

        let now = utc_now(self.clock.as_ref(), self.settings.utc_offset_hours);
        let checkpoint = match resolve_checkpoint(
            source.kind,
            &store,
            self.cursors.get(&source.kind),
            now,
            self.settings.lookback_days,
        ) {
            Ok(checkpoint) => checkpoint,
            Err(e) => return PassReport::new(source.kind, PassOutcome::Aborted(e)),
        };

        WindowController::new(&fetcher, &store, self.clock.as_ref(), &self.shutdown)
            .with_tuning(&self.settings.tuning)
            .with_utc_offset(self.settings.utc_offset_hours)
            .run(checkpoint)
    }

    /// Sleep for the poll interval in short steps; false if interrupted
    fn sleep_between_cycles(&self) -> bool {
        let interval = self.settings.poll_interval;
        info!("Start sleeping for {} minutes.", interval.as_secs() / 60);

        let mut remaining = interval;
        while !remaining.is_zero() {
            if self.shutdown.is_requested() {
                return false;
            }
            let step = remaining.min(SLEEP_STEP);
            self.clock.sleep(step);
            remaining -= step;
        }

        !self.shutdown.is_requested()
    }
}

fn log_report(report: &PassReport) {
    match &report.outcome {
        PassOutcome::CaughtUp => info!(
            "Finished {} audit logs: {} windows, {} records received, {} written, {} duplicates skipped.",
            report.source, report.windows, report.fetched, report.written, report.duplicates
        ),
        PassOutcome::Aborted(e) => error!(
            "{} audit logs pass aborted after {} windows ({} records written), {} error during {}: {}",
            report.source,
            report.windows,
            report.written,
            e.class(),
            e.operation,
            e
        ),
        PassOutcome::Interrupted => warn!(
            "{} audit logs pass interrupted after {} windows ({} records written).",
            report.source, report.windows, report.written
        ),
    }
}
