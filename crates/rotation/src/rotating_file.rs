//! Time-bucketed rotating file
//!
//! Every write renders the file pattern for the current time bucket. When
//! the rendered path differs from the open file, the new file is opened,
//! the symlink (if any) is repointed at it and files older than the
//! retention age are removed.
//!
//! ```text
//! write(record)
//!   ├─ bucket = floor(now, rotation_period)
//!   ├─ path   = pattern.render(bucket)
//!   ├─ path != open path? → open path, update link, purge expired
//!   └─ append record
//! ```
//!
//! Buckets are aligned to the Unix epoch, so an hourly period cuts over on
//! the hour and a daily period at UTC midnight.

use std::fs::{self, File};
use std::io::{self, Write};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use bandlog_core::Sink;
use chrono::{DateTime, Local, Utc};
use parking_lot::Mutex;

use crate::error::{Result, RotationError};
use crate::pattern::FilePattern;

/// Default retention for rotated files (7 days)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Time zone used to render file names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    Local,
    Utc,
}

/// Rotation behavior for a [`RotatingFile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOptions {
    /// Bucket width; `None` or zero keeps the name rendered at open
    pub rotation_period: Option<Duration>,

    /// Files last modified longer ago than this are removed on rotation
    pub max_age: Duration,

    /// Symlink kept pointing at the current file
    pub link_name: Option<PathBuf>,

    pub clock: Clock,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self {
            rotation_period: None,
            max_age: DEFAULT_MAX_AGE,
            link_name: None,
            clock: Clock::Local,
        }
    }
}

impl RotationOptions {
    pub fn with_rotation_period(mut self, period: Option<Duration>) -> Self {
        self.rotation_period = period;
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_link_name(mut self, link_name: Option<PathBuf>) -> Self {
        self.link_name = link_name;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn active_period(&self) -> Option<Duration> {
        self.rotation_period.filter(|period| !period.is_zero())
    }
}

/// Counters for a rotating file
#[derive(Debug, Default)]
pub struct RotationMetrics {
    pub files_opened: AtomicU64,
    pub files_purged: AtomicU64,
    pub records_written: AtomicU64,
    pub bytes_written: AtomicU64,
}

impl RotationMetrics {
    pub fn snapshot(&self) -> RotationSnapshot {
        RotationSnapshot {
            files_opened: self.files_opened.load(Ordering::Relaxed),
            files_purged: self.files_purged.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of rotation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationSnapshot {
    pub files_opened: u64,
    pub files_purged: u64,
    pub records_written: u64,
    pub bytes_written: u64,
}

struct ActiveFile {
    file: Option<File>,
    path: PathBuf,
    closed: bool,
}

/// Synchronous rotating file sink
pub struct RotatingFile {
    pattern: FilePattern,
    options: RotationOptions,
    state: Mutex<ActiveFile>,
    metrics: RotationMetrics,
}

impl RotatingFile {
    /// Validate the pattern and open the file for the current bucket
    pub fn open(pattern: impl Into<String>, options: RotationOptions) -> Result<Self> {
        let pattern = FilePattern::new(pattern)?;
        let glob = pattern.glob();
        glob::Pattern::new(&glob).map_err(|source| RotationError::Glob { glob, source })?;

        if options.active_period().is_some() && !pattern.has_specifiers() {
            tracing::warn!(
                pattern = %pattern,
                "rotation period set but file pattern has no time specifier; file will not rotate"
            );
        }

        let file = Self {
            pattern,
            options,
            state: Mutex::new(ActiveFile {
                file: None,
                path: PathBuf::new(),
                closed: false,
            }),
            metrics: RotationMetrics::default(),
        };

        let path = file.path_for(Utc::now());
        {
            let mut state = file.state.lock();
            file.switch_to(&mut state, path)?;
        }

        tracing::debug!(
            pattern = %file.pattern,
            path = %file.current_path().display(),
            "opened rotating file"
        );

        Ok(file)
    }

    pub fn pattern(&self) -> &FilePattern {
        &self.pattern
    }

    pub fn options(&self) -> &RotationOptions {
        &self.options
    }

    pub fn metrics(&self) -> &RotationMetrics {
        &self.metrics
    }

    /// Path of the file currently written to
    pub fn current_path(&self) -> PathBuf {
        self.state.lock().path.clone()
    }

    /// File path for the bucket containing `now`
    pub fn path_for(&self, now: DateTime<Utc>) -> PathBuf {
        let bucket = match self.options.active_period() {
            Some(period) => truncate(now, period),
            None => now,
        };
        match self.options.clock {
            Clock::Local => self.pattern.render(&bucket.with_timezone(&Local)),
            Clock::Utc => self.pattern.render(&bucket),
        }
    }

    /// Append a record as if written at `now`
    pub fn write_at(&self, record: &[u8], now: DateTime<Utc>) -> Result<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.closed {
            return Err(RotationError::Closed);
        }

        let mut rotated_from = None;
        if self.options.active_period().is_some() {
            let target = self.path_for(now);
            if target != state.path {
                let previous = mem::take(&mut state.path);
                if let Err(err) = self.switch_to(state, target) {
                    state.path = previous;
                    return Err(err);
                }
                rotated_from = Some(previous);
            }
        }

        let Some(file) = state.file.as_mut() else {
            return Err(RotationError::Closed);
        };
        file.write_all(record)
            .map_err(|source| RotationError::io("write", &state.path, source))?;
        self.metrics.records_written.fetch_add(1, Ordering::Relaxed);
        self.metrics
            .bytes_written
            .fetch_add(record.len() as u64, Ordering::Relaxed);

        let current = rotated_from.as_ref().map(|_| state.path.clone());
        drop(guard);

        if let (Some(previous), Some(current)) = (rotated_from, current) {
            tracing::info!(
                from = %previous.display(),
                to = %current.display(),
                "rotated log file"
            );
            self.purge(now, &current);
        }

        Ok(())
    }

    /// Remove files produced by the pattern that are older than the retention age
    ///
    /// The current file and the symlink are never removed. Returns the
    /// number of files removed.
    pub fn purge(&self, now: DateTime<Utc>, current: &Path) -> usize {
        let Some(cutoff) = SystemTime::from(now).checked_sub(self.options.max_age) else {
            return 0;
        };

        let glob = self.pattern.glob();
        let entries = match glob::glob(&glob) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(glob = %glob, error = %err, "cannot scan for expired log files");
                return 0;
            }
        };

        let mut removed = 0;
        for path in entries.flatten() {
            if path == current || self.options.link_name.as_deref() == Some(path.as_path()) {
                continue;
            }
            let Ok(metadata) = fs::symlink_metadata(&path) else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if modified >= cutoff {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    removed += 1;
                    self.metrics.files_purged.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to remove expired log file"
                    );
                }
            }
        }

        if removed > 0 {
            tracing::debug!(removed, pattern = %self.pattern, "purged expired log files");
        }
        removed
    }

    fn switch_to(&self, state: &mut ActiveFile, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|source| RotationError::io("create directory", parent, source))?;
        }

        let file = File::options()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| RotationError::io("open", &path, source))?;

        if let Some(link) = &self.options.link_name
            && let Err(err) = update_link(&path, link)
        {
            tracing::warn!(
                link = %link.display(),
                target = %path.display(),
                error = %err,
                "failed to update log symlink"
            );
        }

        state.file = Some(file);
        state.path = path;
        self.metrics.files_opened.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Sink for RotatingFile {
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        self.write_at(record, Utc::now()).map_err(io::Error::from)
    }

    fn sync(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        match state.file.as_mut() {
            Some(file) => {
                file.flush()?;
                file.sync_data()
            }
            None => Ok(()),
        }
    }

    fn close(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        state.closed = true;
        match state.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFile")
            .field("pattern", &self.pattern)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Start of the epoch-aligned bucket of width `period` containing `now`
pub(crate) fn truncate(now: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    let period_ms = i64::try_from(period.as_millis())
        .unwrap_or(i64::MAX)
        .max(1);
    let millis = now.timestamp_millis();
    DateTime::from_timestamp_millis(millis - millis.rem_euclid(period_ms)).unwrap_or(now)
}

/// Point `link` at `target`, replacing an existing symlink atomically
#[cfg(unix)]
fn update_link(target: &Path, link: &Path) -> io::Result<()> {
    if target == link {
        return Ok(());
    }
    if let Ok(metadata) = fs::symlink_metadata(link)
        && !metadata.file_type().is_symlink()
    {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "link path exists and is not a symlink",
        ));
    }

    let mut staging = link.as_os_str().to_owned();
    staging.push("_symlink");
    let staging = PathBuf::from(staging);

    let _ = fs::remove_file(&staging);
    std::os::unix::fs::symlink(target, &staging)?;
    fs::rename(&staging, link)
}

#[cfg(not(unix))]
fn update_link(_target: &Path, _link: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "rotating_file_test.rs"]
mod rotating_file_test;
