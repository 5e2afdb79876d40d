//! Throttled reporting of destination failures
//!
//! A destination that cannot write (disk full, directory removed) fails on
//! every record it owns. Each destination keeps its own reporting window:
//! the first failure in a window is logged, later ones are only counted and
//! their count is attached to the next report. A broken error file never
//! hides a failure of the access file.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default length of a reporting window (10 seconds)
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Reporting state of one destination
#[derive(Debug, Default)]
struct Window {
    /// When the current window was opened by a report
    opened_at: Option<Instant>,

    /// Failures counted but not logged in the current window
    suppressed: u64,

    total: u64,
}

impl Window {
    /// Count a failure; returns the number suppressed before it if it opens a new window
    fn record(&mut self, now: Instant, interval: Duration) -> Option<u64> {
        self.total += 1;
        if let Some(opened_at) = self.opened_at
            && now.duration_since(opened_at) < interval
        {
            self.suppressed += 1;
            return None;
        }
        self.opened_at = Some(now);
        Some(std::mem::take(&mut self.suppressed))
    }
}

/// Per-destination failure reporter shared by all handles of a logger
pub struct ErrorReporter {
    interval: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl ErrorReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Count a failure of `destination` and log it unless its window is still open
    ///
    /// Returns true if the failure was logged.
    pub fn report(&self, destination: &str, action: &str, error: &dyn fmt::Display) -> bool {
        let outcome = {
            let mut windows = self.windows.lock();
            let window = windows.entry(destination.to_owned()).or_default();
            window
                .record(Instant::now(), self.interval)
                .map(|suppressed| (suppressed, window.total))
        };
        let Some((suppressed, total)) = outcome else {
            return false;
        };

        if suppressed > 0 {
            tracing::error!(
                destination,
                action,
                error = %error,
                suppressed,
                total,
                "log destination failed; earlier failures suppressed"
            );
        } else {
            tracing::error!(destination, action, error = %error, total, "log destination failed");
        }
        true
    }

    /// Failures counted but not yet logged, across all destinations
    pub fn pending_count(&self) -> u64 {
        self.windows.lock().values().map(|w| w.suppressed).sum()
    }

    /// Failures ever counted, across all destinations
    pub fn total_count(&self) -> u64 {
        self.windows.lock().values().map(|w| w.total).sum()
    }

    /// Failures ever counted for one destination
    pub fn failures_of(&self, destination: &str) -> u64 {
        self.windows
            .lock()
            .get(destination)
            .map_or(0, |window| window.total)
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_INTERVAL)
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("interval", &self.interval)
            .field("destinations", &self.windows.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "error_reporter_test.rs"]
mod error_reporter_test;
