use std::ops::{Deref, DerefMut};

use bytes::BytesMut;
use serde::Deserialize;
use tracing::debug;

/// Default largest buffer kept for reuse: 64 KiB.
pub const DEFAULT_HIGH_WATER_MARK: usize = 64 * 1024;

/// Default number of idle buffers kept for reuse.
pub const DEFAULT_MAX_RETAINED: usize = 8;

/// Default smallest allocation handed out.
pub const DEFAULT_MIN_CAPACITY: usize = 256;

/// Retention policy for a [`BufferPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Buffers with a larger capacity are dropped on release instead of retained.
    pub high_water_mark: usize,
    /// Maximum number of idle buffers kept on the free list.
    pub max_retained: usize,
    /// Fresh allocations are at least this large so small messages share buffers.
    pub min_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            max_retained: DEFAULT_MAX_RETAINED,
            min_capacity: DEFAULT_MIN_CAPACITY,
        }
    }
}

/// Counters describing pool behavior since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Acquires served from the free list.
    pub hits: u64,
    /// Acquires that allocated a new buffer.
    pub misses: u64,
    /// Releases that dropped the buffer (oversized, or free list full).
    pub discarded: u64,
}

/// A byte buffer on loan from a [`BufferPool`].
///
/// The visible length is the size requested at acquire time; the
/// allocation behind it may be larger.
#[derive(Debug)]
pub struct PooledBuffer {
    buf: BytesMut,
}

impl PooledBuffer {
    /// Capacity of the underlying allocation.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Change the visible length, zero-filling any newly exposed bytes.
    pub fn resize(&mut self, len: usize) {
        self.buf.resize(len, 0);
    }

    /// Shorten the visible length, keeping the allocation.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

/// Free list of reusable byte buffers.
///
/// Not thread-safe by itself: a pool belongs to exactly one owner (normally
/// a single channel) and is driven from one thread at a time.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Vec<BytesMut>,
    config: PoolConfig,
    stats: PoolStats,
}

impl BufferPool {
    /// Create an empty pool with default retention policy.
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty pool with explicit retention policy.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            free: Vec::with_capacity(config.max_retained),
            config,
            stats: PoolStats::default(),
        }
    }

    /// Borrow a buffer of exactly `min_size` visible bytes.
    ///
    /// Reuses the smallest idle buffer whose capacity fits, otherwise
    /// allocates. The visible bytes are zero-filled, so nothing from a
    /// previous message is readable through the returned buffer.
    pub fn acquire(&mut self, min_size: usize) -> PooledBuffer {
        let best = self
            .free
            .iter()
            .enumerate()
            .filter(|(_, buf)| buf.capacity() >= min_size)
            .min_by_key(|(_, buf)| buf.capacity())
            .map(|(idx, _)| idx);

        let mut buf = match best {
            Some(idx) => {
                self.stats.hits += 1;
                self.free.swap_remove(idx)
            }
            None => {
                self.stats.misses += 1;
                BytesMut::with_capacity(min_size.max(self.config.min_capacity))
            }
        };

        buf.clear();
        buf.resize(min_size, 0);
        PooledBuffer { buf }
    }

    /// Return a buffer to the pool.
    ///
    /// Buffers above the high-water mark are dropped. When the free list is
    /// full, the smallest idle buffer makes room for a larger one; otherwise
    /// the released buffer is dropped.
    pub fn release(&mut self, buffer: PooledBuffer) {
        let buf = buffer.buf;
        let capacity = buf.capacity();

        if capacity > self.config.high_water_mark {
            debug!(
                capacity,
                high_water_mark = self.config.high_water_mark,
                "dropping oversized buffer"
            );
            self.stats.discarded += 1;
            return;
        }

        if self.free.len() < self.config.max_retained {
            self.free.push(buf);
            return;
        }

        let smallest = self
            .free
            .iter()
            .enumerate()
            .min_by_key(|(_, buf)| buf.capacity())
            .map(|(idx, buf)| (idx, buf.capacity()));

        match smallest {
            Some((idx, smallest_capacity)) if smallest_capacity < capacity => {
                debug!(
                    evicted = smallest_capacity,
                    retained = capacity,
                    "pool full, evicting smaller buffer"
                );
                self.free[idx] = buf;
            }
            _ => {}
        }
        self.stats.discarded += 1;
    }

    /// Number of idle buffers currently held.
    pub fn retained(&self) -> usize {
        self.free.len()
    }

    /// Total capacity of idle buffers currently held.
    pub fn retained_bytes(&self) -> usize {
        self.free.iter().map(BytesMut::capacity).sum()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Drop every idle buffer.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}
