//! RAII handle for page access.
//!
//! A [`PageHandle`] is what [`BufferPoolManager::fetch_page`] hands out. It
//! owns two obligations on one frame:
//! - the content latch (shared or exclusive), and
//! - one pin.
//!
//! Dropping the handle releases the latch first, then the pin, exactly once.
//! Handles can be moved but never cloned, and the page bytes borrow from
//! the handle, so they cannot outlive it.

use std::ops::Deref;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use tracing::error;

use crate::common::{FrameId, PageId};
use crate::storage::page::Page;

use super::buffer_pool_manager::BufferPoolManager;

/// The content latch held by a handle.
enum PageLatch<'a> {
    Shared(RwLockReadGuard<'a, Page>),
    Exclusive(RwLockWriteGuard<'a, Page>),
}

/// One pin on a frame, released on drop.
struct PinGuard<'a> {
    bpm: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    armed: bool,
}

impl Drop for PinGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.bpm.release_pin(self.frame_id).is_none() {
            // A handle always owns a pin; losing it means someone called
            // unpin_page for a pin they did not own.
            error!(
                "pin count underflow releasing handle for {} in {}",
                self.page_id, self.frame_id
            );
            debug_assert!(false, "pin count underflow on handle release");
        }
    }
}

/// A pinned, latched page in the buffer pool.
///
/// Read handles share the latch with other readers; write handles hold it
/// exclusively. Mutable access is only available through a write handle and
/// marks the page dirty.
///
/// # Example
/// ```ignore
/// let mut handle = bpm.fetch_page(page_id, true)?;
/// if let Some(page) = handle.page_mut() {
///     page.as_mut_slice()[0] = 0xFF;
/// }
/// // handle drops here: latch released, then page unpinned
/// ```
pub struct PageHandle<'a> {
    // Field order is drop order: latch before pin.
    latch: PageLatch<'a>,
    pin: PinGuard<'a>,
}

impl<'a> PageHandle<'a> {
    /// Wrap a shared latch on a frame the caller has already pinned.
    pub(crate) fn shared(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        guard: RwLockReadGuard<'a, Page>,
    ) -> Self {
        Self {
            latch: PageLatch::Shared(guard),
            pin: PinGuard {
                bpm,
                frame_id,
                page_id,
                armed: true,
            },
        }
    }

    /// Wrap an exclusive latch on a frame the caller has already pinned.
    pub(crate) fn exclusive(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        guard: RwLockWriteGuard<'a, Page>,
    ) -> Self {
        Self {
            latch: PageLatch::Exclusive(guard),
            pin: PinGuard {
                bpm,
                frame_id,
                page_id,
                armed: true,
            },
        }
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }

    /// Get the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.pin.frame_id
    }

    /// Whether this handle holds the exclusive latch.
    #[inline]
    pub fn is_writable(&self) -> bool {
        matches!(self.latch, PageLatch::Exclusive(_))
    }

    /// Read access to the page bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self.deref().as_slice()
    }

    /// Mutable access to the page, or `None` on a read handle.
    ///
    /// The frame is marked dirty before the reference is returned, so a
    /// modification can never be evicted without being written back.
    pub fn page_mut(&mut self) -> Option<&mut Page> {
        match &mut self.latch {
            PageLatch::Shared(_) => None,
            PageLatch::Exclusive(guard) => {
                self.pin.bpm.frame(self.pin.frame_id).mark_dirty();
                Some(&mut **guard)
            }
        }
    }

    /// Mutable access to the page bytes, or `None` on a read handle.
    #[inline]
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        self.page_mut().map(Page::as_mut_slice)
    }

    /// Release the latch and the pin now.
    #[inline]
    pub fn release(self) {
        drop(self);
    }

    /// Release the latch but keep the pin.
    ///
    /// The caller takes over the pin and must later return it with
    /// [`BufferPoolManager::unpin_page`]. Until then the page stays
    /// resident.
    pub fn into_pin(self) -> PageId {
        let PageHandle { latch, mut pin } = self;
        drop(latch);
        pin.armed = false;
        pin.page_id
    }
}

impl Deref for PageHandle<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        match &self.latch {
            PageLatch::Shared(guard) => &**guard,
            PageLatch::Exclusive(guard) => &**guard,
        }
    }
}

impl std::fmt::Debug for PageHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageHandle")
            .field("page_id", &self.page_id())
            .field("frame_id", &self.frame_id())
            .field("writable", &self.is_writable())
            .finish()
    }
}
