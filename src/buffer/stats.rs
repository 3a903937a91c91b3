//! Buffer pool statistics.
//!
//! Two kinds of numbers are reported:
//! - [`PoolStats`] - occupancy of the frame array (free, pinned, dirty)
//! - [`BufferPoolStats`] - running activity counters (hits, misses, I/O)

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time occupancy of the frame array.
///
/// Built by scanning frames one at a time without a global lock, so the
/// four numbers are not guaranteed to be consistent with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Number of frames in the pool.
    pub total_frames: usize,
    /// Frames on the free list.
    pub free_frames: usize,
    /// Frames with a pin count above zero.
    pub pinned_frames: usize,
    /// Resident frames whose bytes differ from disk.
    pub dirty_frames: usize,
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PoolStats {{ total: {}, free: {}, pinned: {}, dirty: {} }}",
            self.total_frames, self.free_frames, self.pinned_frames, self.dirty_frames
        )
    }
}

/// Activity counters kept by the buffer pool.
///
/// All fields are atomic and updated with `Ordering::Relaxed`: the counters
/// are independent and only need to be eventually accurate.
#[derive(Debug, Default)]
pub struct BufferPoolStats {
    /// Fetches served from a resident frame.
    pub cache_hits: AtomicU64,

    /// Fetches that had to load the page from disk.
    pub cache_misses: AtomicU64,

    /// Resident pages removed to make room for another page.
    pub evictions: AtomicU64,

    /// Pages read through the disk page store.
    pub pages_read: AtomicU64,

    /// Pages written through the disk page store.
    pub pages_written: AtomicU64,
}

impl BufferPoolStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        for counter in [
            &self.cache_hits,
            &self.cache_misses,
            &self.evictions,
            &self.pages_read,
            &self.pages_written,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// A plain copy of [`BufferPoolStats`] for display and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    pub pages_written: u64,
}

impl StatsSnapshot {
    /// Fraction of fetches served without disk I/O (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, reads: {}, writes: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.pages_read,
            self.pages_written,
            self.hit_rate() * 100.0
        )
    }
}
