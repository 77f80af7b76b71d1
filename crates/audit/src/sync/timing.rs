//! Clock abstraction and time arithmetic for the sync engine
//!
//! Pure functions plus a [`Clock`] seam so pagination, retries and the
//! scheduler can be tested without real sleeps.

use chrono::{DateTime, Duration, Local, NaiveDateTime, Utc};
use std::sync::Mutex;

/// Source of wall-clock time and blocking sleeps
pub trait Clock: Send + Sync {
    /// Host wall-clock reading. May be local time; see [`utc_now`].
    fn wall_now(&self) -> NaiveDateTime;

    /// Block the current thread
    fn sleep(&self, duration: std::time::Duration);
}

/// Real clock backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn wall_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&self, duration: std::time::Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated clock: sleeping advances time instantly and is recorded
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
    sleeps: Mutex<Vec<std::time::Duration>>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move the clock forward without recording a sleep
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<std::time::Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for ManualClock {
    fn wall_now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: std::time::Duration) {
        self.sleeps.lock().unwrap().push(duration);
        if let Ok(step) = Duration::from_std(duration) {
            self.advance(step);
        }
    }
}

/// Current UTC time given the host clock's offset from UTC in hours
///
/// The offset describes how far the host wall clock is ahead of UTC
/// (e.g. `3` for a host running on UTC+3 local time).
pub fn utc_now(clock: &dyn Clock, utc_offset_hours: i32) -> DateTime<Utc> {
    (clock.wall_now() - Duration::hours(i64::from(utc_offset_hours))).and_utc()
}

/// Earliest point a cold start is allowed to backfill from
///
/// Saturates at the earliest representable time.
pub fn lookback_start(now: DateTime<Utc>, lookback_days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(lookback_days))
        .and_then(|days| now.checked_sub_signed(days))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Linear backoff: `base * attempt`
pub fn backoff_delay(base: std::time::Duration, attempt: u32) -> std::time::Duration {
    base * attempt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn wall(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_utc_now_applies_offset() {
        let clock = ManualClock::new(wall(12));
        assert_eq!(utc_now(&clock, 3).naive_utc(), wall(9));
        assert_eq!(utc_now(&clock, -5).naive_utc(), wall(17));
        assert_eq!(utc_now(&clock, 0).naive_utc(), wall(12));
    }

    #[test]
    fn test_lookback_start() {
        let now = wall(12).and_utc();
        let start = lookback_start(now, 90);
        assert_eq!((now - start).num_days(), 90);
    }

    #[test]
    fn test_lookback_start_saturates() {
        let now = wall(12).and_utc();
        assert_eq!(lookback_start(now, 200_000_000), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_backoff_is_linear() {
        let base = std::time::Duration::from_secs(2);
        assert_eq!(backoff_delay(base, 1), std::time::Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2), std::time::Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 3), std::time::Duration::from_secs(6));
    }

    #[test]
    fn test_manual_clock_sleep_advances() {
        let clock = ManualClock::new(wall(1));
        clock.sleep(std::time::Duration::from_secs(3600));
        assert_eq!(clock.wall_now(), wall(2));
        assert_eq!(clock.sleeps(), vec![std::time::Duration::from_secs(3600)]);
    }
}
