//! Pool of encode buffers
//!
//! Every record is rendered into a `BytesMut` checked out of a pool and
//! checked back in once the sink has written it. The pool is an explicit
//! `Arc<BufferPool>` handed to each encoder, so loggers built separately do
//! not share buffers unless their caller wants them to.
//!
//! # Example
//!
//! ```
//! use bandlog_core::{BufferPool, BufferPoolConfig};
//!
//! let pool = BufferPool::new(BufferPoolConfig::default());
//!
//! let mut buf = pool.checkout();
//! buf.extend_from_slice(b"[info] user=alice");
//! // ... write buf ...
//! pool.checkin(buf);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;

/// Sizing for a [`BufferPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Maximum number of idle buffers kept
    pub pool_size: usize,

    /// Initial capacity of newly allocated buffers
    pub buffer_capacity: usize,

    /// Buffers that grew beyond this are released instead of kept
    pub max_retained_capacity: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 64,
            buffer_capacity: 1024,
            max_retained_capacity: 64 * 1024,
        }
    }
}

/// Lock-free pool of reusable record buffers
///
/// Starts empty and fills as buffers are checked in. A checkout from an
/// empty pool allocates.
pub struct BufferPool {
    idle: ArrayQueue<BytesMut>,
    config: BufferPoolConfig,
    metrics: BufferPoolMetrics,
}

/// Counters for pool monitoring
#[derive(Debug, Default)]
pub struct BufferPoolMetrics {
    /// Checkouts served by an idle buffer
    pub reused: AtomicU64,

    /// Checkouts that had to allocate
    pub allocated: AtomicU64,

    /// Buffers checked back in and kept
    pub retained: AtomicU64,

    /// Buffers checked back in and released (oversized, empty or pool full)
    pub released: AtomicU64,
}

impl BufferPoolMetrics {
    pub const fn new() -> Self {
        Self {
            reused: AtomicU64::new(0),
            allocated: AtomicU64::new(0),
            retained: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    #[inline]
    fn record_reuse(&self) {
        self.reused.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_allocation(&self) {
        self.allocated.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_retain(&self) {
        self.retained.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_release(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> BufferPoolSnapshot {
        BufferPoolSnapshot {
            reused: self.reused.load(Ordering::Relaxed),
            allocated: self.allocated.load(Ordering::Relaxed),
            retained: self.retained.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferPoolSnapshot {
    pub reused: u64,
    pub allocated: u64,
    pub retained: u64,
    pub released: u64,
}

impl BufferPoolSnapshot {
    /// Buffers currently checked out, as far as the counters can tell
    pub fn outstanding(&self) -> u64 {
        (self.reused + self.allocated).saturating_sub(self.retained + self.released)
    }

    /// Share of checkouts served without allocating (0.0 to 1.0)
    pub fn reuse_rate(&self) -> f64 {
        let total = self.reused + self.allocated;
        if total == 0 {
            1.0
        } else {
            self.reused as f64 / total as f64
        }
    }
}

impl BufferPool {
    pub fn new(config: BufferPoolConfig) -> Self {
        Self {
            idle: ArrayQueue::new(config.pool_size.max(1)),
            config,
            metrics: BufferPoolMetrics::new(),
        }
    }

    /// Take an empty buffer, reusing an idle one when available
    #[inline]
    pub fn checkout(&self) -> BytesMut {
        match self.idle.pop() {
            Some(buf) => {
                self.metrics.record_reuse();
                buf
            }
            None => {
                self.metrics.record_allocation();
                BytesMut::with_capacity(self.config.buffer_capacity)
            }
        }
    }

    /// Hand a buffer back; it is cleared and kept if it is worth keeping
    #[inline]
    pub fn checkin(&self, mut buf: BytesMut) {
        buf.clear();

        let capacity = buf.capacity();
        if capacity == 0 || capacity > self.config.max_retained_capacity {
            self.metrics.record_release();
            return;
        }

        match self.idle.push(buf) {
            Ok(()) => self.metrics.record_retain(),
            Err(_) => self.metrics.record_release(),
        }
    }

    /// Idle buffers ready for checkout
    #[inline]
    pub fn idle(&self) -> usize {
        self.idle.len()
    }

    #[inline]
    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> &BufferPoolMetrics {
        &self.metrics
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(BufferPoolConfig::default())
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("idle", &self.idle.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
#[path = "buffer_pool_test.rs"]
mod buffer_pool_test;
