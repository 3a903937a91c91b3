//! Buffer frames.
//!
//! A [`Frame`] is one slot of the pool's fixed frame array. Besides the page
//! bytes it tracks residency, pins and dirtiness, each with its own
//! synchronization so the hot path never takes a frame-wide lock.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::page::Page;

/// One slot of the buffer pool.
///
/// | field      | guards                          | sync          |
/// |------------|---------------------------------|---------------|
/// | `latch`    | page bytes (the content latch)  | `RwLock`      |
/// | `resident` | which page occupies the frame   | `Mutex`       |
/// | `pins`     | outstanding users of the frame  | `AtomicU32`   |
/// | `dirty`    | bytes differ from the disk copy | `AtomicBool`  |
///
/// Residency only changes while the pool's fault latch is held and the frame
/// is unpinned, so readers of `page_id()` outside that latch see a stable
/// value for as long as they hold a pin.
pub struct Frame {
    latch: RwLock<Page>,
    resident: Mutex<Option<PageId>>,
    pins: AtomicU32,
    dirty: AtomicBool,
}

impl Frame {
    /// Create a free frame with a zeroed page.
    pub fn new() -> Self {
        Self {
            latch: RwLock::new(Page::new()),
            resident: Mutex::new(None),
            pins: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    /// Take the shared content latch.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.latch.read()
    }

    /// Take the exclusive content latch.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Page> {
        self.latch.write()
    }

    // --- residency ---

    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        *self.resident.lock()
    }

    #[inline]
    pub fn set_page_id(&self, page_id: Option<PageId>) {
        *self.resident.lock() = page_id;
    }

    /// True when no page occupies the frame.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.page_id().is_none()
    }

    /// True when the frame holds a page nobody has pinned.
    #[inline]
    pub fn is_evictable(&self) -> bool {
        !self.is_pinned() && !self.is_free()
    }

    /// Make a free frame resident for `page_id` with `bytes`, pinned once
    /// for the caller and clean.
    ///
    /// The frame must be unreachable by other threads: off the free list and
    /// not yet published in the page table.
    pub(crate) fn install(&self, page_id: PageId, bytes: &Page) {
        self.latch.write().copy_from(bytes);
        self.set_page_id(Some(page_id));
        self.dirty.store(false, Ordering::Release);
        self.pins.store(1, Ordering::Release);
    }

    /// Return the frame to the free state: zeroed bytes, no page, no pins,
    /// clean.
    ///
    /// Same reachability requirement as [`Frame::install`], so the latch is
    /// uncontended.
    pub fn reset(&self) {
        self.latch.write().reset();
        self.set_page_id(None);
        self.pins.store(0, Ordering::Release);
        self.dirty.store(false, Ordering::Release);
    }

    // --- pins ---

    /// Add a pin, returning the new count.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pins.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Drop a pin, returning the new count.
    ///
    /// At zero the count is left alone and `None` comes back.
    #[inline]
    pub fn try_unpin(&self) -> Option<u32> {
        self.pins
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .ok()
            .map(|prev| prev - 1)
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pins.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() != 0
    }

    // --- dirty flag ---

    /// Flag the bytes as modified. Stays set until [`Frame::clear_dirty`].
    #[inline]
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    #[inline]
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("page_id", &self.page_id())
            .field("pins", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .finish_non_exhaustive()
    }
}
