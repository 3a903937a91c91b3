//! CLOCK (second-chance) replacement policy.
//!
//! An approximation of LRU that keeps one access bit per frame instead of
//! an ordered list:
//! 1. Every fetch sets the frame's access bit
//! 2. A hand sweeps the frame array looking for a victim
//! 3. An unpinned frame with its bit set gets a second chance: the bit is
//!    cleared and the hand moves on
//! 4. An unpinned frame with its bit clear is the victim
//!
//! Recording an access is a single atomic store, which keeps the fetch hot
//! path free of locks.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::buffer::Frame;
use crate::common::FrameId;

/// Clock eviction state, stored parallel to the frame array.
///
/// The policy reads pin counts straight from the frames, so it needs no
/// pin/unpin notifications and can never pick a pinned frame.
pub struct ClockReplacer {
    /// One access bit per frame, indexed like the frame array.
    access_bits: Box<[AtomicBool]>,

    /// Position where the next sweep starts.
    hand: AtomicUsize,
}

impl ClockReplacer {
    /// Create a replacer for `num_frames` frames.
    pub fn new(num_frames: usize) -> Self {
        let access_bits = (0..num_frames)
            .map(|_| AtomicBool::new(false))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            access_bits,
            hand: AtomicUsize::new(0),
        }
    }

    /// Record that a frame was accessed.
    #[inline]
    pub fn record_access(&self, frame_id: FrameId) {
        self.access_bits[frame_id.0].store(true, Ordering::Release);
    }

    /// Forget a frame's access history (the frame became free).
    #[inline]
    pub fn remove(&self, frame_id: FrameId) {
        self.access_bits[frame_id.0].store(false, Ordering::Release);
    }

    #[cfg(test)]
    fn access_bit(&self, frame_id: FrameId) -> bool {
        self.access_bits[frame_id.0].load(Ordering::Acquire)
    }

    /// Current hand position.
    #[inline]
    fn hand(&self) -> usize {
        self.hand.load(Ordering::Relaxed)
    }

    /// Number of frames tracked.
    #[inline]
    fn capacity(&self) -> usize {
        self.access_bits.len()
    }

    /// Select a victim frame.
    ///
    /// Sweeps from the hand in circular order. Free and pinned frames are
    /// skipped with their bits untouched. The sweep is bounded to two full
    /// circuits: the first clears the bits of every unpinned frame, so the
    /// second finds a victim unless every resident frame is pinned.
    ///
    /// Returns `None` if no unpinned resident frame exists. The caller must
    /// serialize calls (the buffer pool holds its coordination lock).
    pub fn select_victim(&self, frames: &[Frame]) -> Option<FrameId> {
        let num_frames = self.access_bits.len();
        debug_assert_eq!(frames.len(), num_frames);
        if num_frames == 0 {
            return None;
        }

        let start = self.hand.load(Ordering::Relaxed);

        for step in 0..2 * num_frames {
            let pos = (start + step) % num_frames;

            if !frames[pos].is_evictable() {
                continue;
            }

            // Second chance: clear the bit and move on
            if self.access_bits[pos].swap(false, Ordering::AcqRel) {
                continue;
            }

            self.hand.store((pos + 1) % num_frames, Ordering::Relaxed);
            return Some(FrameId::new(pos));
        }

        None
    }
}

impl std::fmt::Debug for ClockReplacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClockReplacer")
            .field("capacity", &self.capacity())
            .field("hand", &self.hand())
            .finish()
    }
}
