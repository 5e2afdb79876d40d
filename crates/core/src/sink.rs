//! Byte sinks
//!
//! A sink receives finished records. Implementations serialize concurrent
//! writers themselves, so callers share a sink behind an `Arc`.

use std::fmt;
use std::io::{self, Write};

use parking_lot::Mutex;

/// Destination for encoded records
pub trait Sink: Send + Sync {
    /// Write one complete record
    fn write_record(&self, record: &[u8]) -> io::Result<()>;

    /// Flush anything buffered to the underlying storage
    fn sync(&self) -> io::Result<()>;

    /// Flush and release the underlying resource
    fn close(&self) -> io::Result<()>;
}

/// Any `io::Write` guarded by a mutex
///
/// Handy for stdout/stderr and in-memory capture in tests.
pub struct LockedWriter<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> LockedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Run `f` against the wrapped writer
    pub fn with_inner<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W: Write + Send> Sink for LockedWriter<W> {
    fn write_record(&self, record: &[u8]) -> io::Result<()> {
        self.inner.lock().write_all(record)
    }

    fn sync(&self) -> io::Result<()> {
        self.inner.lock().flush()
    }

    fn close(&self) -> io::Result<()> {
        self.sync()
    }
}

impl<W> fmt::Debug for LockedWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedWriter").finish_non_exhaustive()
    }
}
