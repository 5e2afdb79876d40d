//! Logger front-end
//!
//! A [`Logger`] is a cheap handle over the shared fan-out. Clones share the
//! destinations; [`Logger::with`] and [`Logger::named`] derive child loggers
//! that add context fields or a name without touching the parent.

use std::borrow::Cow;
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bandlog_config::LoggerConfig;
use bandlog_core::{Caller, Entry, Field, Level};

use crate::error::{Error, Result};
use crate::error_reporter::ErrorReporter;
use crate::layer::BandedLayer;
use crate::unit::FanOut;

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside a logger dispatch
pub(crate) fn is_dispatching() -> bool {
    DISPATCHING.with(Cell::get)
}

/// Marks the current thread as dispatching until dropped
struct DispatchGuard {
    previous: bool,
}

impl DispatchGuard {
    fn enter() -> Self {
        Self {
            previous: DISPATCHING.with(|flag| flag.replace(true)),
        }
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(self.previous));
    }
}

/// Counters shared by every handle of a logger
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    /// Records written (once per accepting destination)
    pub records_written: AtomicU64,
    /// Bytes written across destinations
    pub bytes_written: AtomicU64,
    /// Records below every destination's band
    pub records_dropped: AtomicU64,
    /// Records that failed to encode
    pub encode_errors: AtomicU64,
    /// Records that failed to reach their sink
    pub write_errors: AtomicU64,
}

impl LoggerMetrics {
    pub fn snapshot(&self) -> LoggerMetricsSnapshot {
        LoggerMetricsSnapshot {
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`LoggerMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerMetricsSnapshot {
    pub records_written: u64,
    pub bytes_written: u64,
    pub records_dropped: u64,
    pub encode_errors: u64,
    pub write_errors: u64,
}

/// Banded multi-destination logger
#[derive(Debug, Clone)]
pub struct Logger {
    fanout: Arc<FanOut>,
    add_caller: bool,
    name: Option<Cow<'static, str>>,
    metrics: Arc<LoggerMetrics>,
    reporter: Arc<ErrorReporter>,
}

impl Logger {
    pub fn new(fanout: FanOut, add_caller: bool) -> Self {
        Self {
            fanout: Arc::new(fanout),
            add_caller,
            name: None,
            metrics: Arc::new(LoggerMetrics::default()),
            reporter: Arc::new(ErrorReporter::default()),
        }
    }

    /// Assemble a logger from a parsed configuration
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        crate::assemble(config.add_caller, config.destinations.clone())
    }

    /// Replace the error reporter, e.g. to change its interval
    pub fn with_error_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Child logger whose name is this logger's name plus `name`, dot-joined
    pub fn named(&self, name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let name = match &self.name {
            Some(parent) if !name.is_empty() => Cow::Owned(format!("{parent}.{name}")),
            Some(parent) => parent.clone(),
            None => name,
        };
        Self {
            name: Some(name),
            ..self.clone()
        }
    }

    /// Child logger whose records all carry `fields`
    pub fn with(&self, fields: &[Field]) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        Self {
            fanout: Arc::new(self.fanout.with_fields(fields)),
            ..self.clone()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn add_caller(&self) -> bool {
        self.add_caller
    }

    /// Whether any destination would write a record at `level`
    pub fn enabled(&self, level: Level) -> bool {
        self.fanout.enabled(level)
    }

    /// Names of the destinations that own `level`
    pub fn destinations_for(&self, level: Level) -> Vec<&str> {
        self.fanout.accepting(level)
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// `tracing` layer feeding events into this logger
    pub fn layer(&self) -> BandedLayer {
        BandedLayer::new(self.clone())
    }

    /// Log a record; failures are counted and reported, not returned
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: &[Field]) {
        let _ = self.try_log(level, message, fields);
    }

    /// Log a record, returning the first destination failure
    #[track_caller]
    pub fn try_log(&self, level: Level, message: &str, fields: &[Field]) -> Result<()> {
        if !self.fanout.enabled(level) {
            self.metrics.records_dropped.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        let mut entry = Entry::new(level, message);
        if let Some(name) = &self.name {
            entry = entry.with_logger_name(name.clone());
        }
        if self.add_caller {
            entry = entry.with_caller(Caller::here());
        }
        self.log_entry(&entry, fields)
    }

    #[track_caller]
    pub fn trace(&self, message: &str, fields: &[Field]) {
        self.log(Level::Trace, message, fields);
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: &[Field]) {
        self.log(Level::Debug, message, fields);
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: &[Field]) {
        self.log(Level::Info, message, fields);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: &[Field]) {
        self.log(Level::Warn, message, fields);
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: &[Field]) {
        self.log(Level::Error, message, fields);
    }

    /// Write a fully built entry to every destination owning its level
    pub fn log_entry(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        let _guard = DispatchGuard::enter();

        let dispatch = self.fanout.write(entry, fields);
        if dispatch.written == 0 && dispatch.failures.is_empty() {
            self.metrics.records_dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.metrics
            .records_written
            .fetch_add(dispatch.written as u64, Ordering::Relaxed);
        self.metrics
            .bytes_written
            .fetch_add(dispatch.bytes as u64, Ordering::Relaxed);

        let mut first = None;
        for (destination, err) in dispatch.failures {
            let action = match &err {
                Error::Encode(_) => {
                    self.metrics.encode_errors.fetch_add(1, Ordering::Relaxed);
                    "encode"
                }
                _ => {
                    self.metrics.write_errors.fetch_add(1, Ordering::Relaxed);
                    "write"
                }
            };
            self.reporter.report(&destination, action, &err);
            first.get_or_insert(err);
        }
        first.map_or(Ok(()), Err)
    }

    /// Flush every destination to storage
    pub fn sync(&self) -> Result<()> {
        self.fanout.sync()
    }

    /// Flush and close every destination
    ///
    /// Later writes through any handle fail and are reported.
    pub fn close(&self) -> Result<()> {
        let result = self.fanout.close();
        tracing::debug!(
            destinations = self.fanout.units().len(),
            "closed banded logger"
        );
        result
    }
}

#[cfg(test)]
#[path = "logger_test.rs"]
mod logger_test;
