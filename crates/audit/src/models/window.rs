//! Time windows submitted to the audit APIs

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use super::record::format_cursor;

/// A bounded `[started_at, ended_at]` range fetched in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl FetchWindow {
    pub fn new(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            ended_at,
        }
    }

    /// Plan the next window starting at `started_at`.
    ///
    /// The window spans `max_len` unless that would pass `now`, in which case
    /// it ends at `now` and is the final window of the pass (second value is
    /// `true`). A start in the future yields an empty final window.
    pub fn plan(started_at: DateTime<Utc>, now: DateTime<Utc>, max_len: Duration) -> (Self, bool) {
        if now - started_at > max_len {
            (Self::new(started_at, started_at + max_len), false)
        } else {
            (Self::new(started_at, now.max(started_at)), true)
        }
    }

    pub fn len(&self) -> Duration {
        self.ended_at - self.started_at
    }

    pub fn is_empty(&self) -> bool {
        self.ended_at <= self.started_at
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            format_cursor(&self.started_at),
            format_cursor(&self.ended_at)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn test_plan_bounded_by_budget() {
        let (window, last) = FetchWindow::plan(at(0, 0), at(10, 0), Duration::minutes(180));
        assert_eq!(window, FetchWindow::new(at(0, 0), at(3, 0)));
        assert!(!last);
        assert_eq!(window.len(), Duration::minutes(180));
    }

    #[test]
    fn test_plan_final_window_ends_now() {
        let (window, last) = FetchWindow::plan(at(9, 0), at(10, 30), Duration::minutes(180));
        assert_eq!(window, FetchWindow::new(at(9, 0), at(10, 30)));
        assert!(last);
    }

    #[test]
    fn test_plan_exact_budget_is_final() {
        let (window, last) = FetchWindow::plan(at(7, 0), at(10, 0), Duration::minutes(180));
        assert_eq!(window.ended_at, at(10, 0));
        assert!(last);
    }

    #[test]
    fn test_plan_start_in_future() {
        let (window, last) = FetchWindow::plan(at(11, 0), at(10, 0), Duration::minutes(180));
        assert!(window.is_empty());
        assert!(last);
    }

    #[test]
    fn test_display() {
        let window = FetchWindow::new(at(0, 0), at(3, 0));
        assert_eq!(window.to_string(), "2024-03-01T00:00:00Z to 2024-03-01T03:00:00Z");
    }
}
