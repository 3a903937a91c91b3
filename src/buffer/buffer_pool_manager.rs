//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting through [`PageHandle`]s
//! - Write-back of dirty pages on flush and eviction
//! - CLOCK eviction of unpinned pages

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::buffer::replacer::ClockReplacer;
use crate::buffer::stats::PoolStats;
use crate::buffer::{BufferPoolConfig, BufferPoolStats, Frame, PageHandle, PageTable};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::DiskPageStore;

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │        frames: Vec<Frame>         │   │
/// │  │ (sharded)    │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  │PageId → Fid  │  └───────────────────────────────────┘   │
/// │  └──────────────┘                                          │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │    store     │      │
/// │  │ Vec<FrameId> │  │ ClockReplacer│  │DiskPageStore │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// │  ┌──────────────┐                                          │
/// │  │ fault_latch  │  serializes page faults                  │
/// │  └──────────────┘                                          │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `page_table`: one `RwLock` per shard. A hit pins its frame under the
///   shard's read lock; eviction unmaps a victim under the shard's write
///   lock only if it is still unpinned, so a pinned frame is never evicted.
/// - `fault_latch`: `Mutex` held for the whole miss path (double-check,
///   frame acquisition, disk load, publish). A page is therefore never
///   loaded into two frames. Never held while waiting on a content latch
///   another thread owns.
/// - `free_list`: `Mutex`, held only for a push or pop.
/// - `replacer`: atomic access bits, hand moved only under `fault_latch`.
/// - `frames`: no lock - fixed size, each Frame has internal locks.
/// - `store`: stateless, no lock.
///
/// # Usage
/// ```ignore
/// let store = DiskPageStore::open("data")?;
/// let bpm = BufferPoolManager::new(10, store);
///
/// let mut handle = bpm.fetch_page_write(page_id)?;
/// handle.as_mut_slice().unwrap()[0] = 0xAB;
/// drop(handle); // latch released, page unpinned, page stays dirty
///
/// bpm.flush_page(page_id)?;
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Maps resident page IDs to frame IDs.
    page_table: PageTable<PageId, FrameId>,

    /// Stack of free frame IDs.
    free_list: Mutex<Vec<FrameId>>,

    /// CLOCK eviction state.
    replacer: ClockReplacer,

    /// Coordination lock for the page fault path.
    fault_latch: Mutex<()>,

    /// Handles all disk I/O.
    store: DiskPageStore,

    /// Activity counters.
    stats: BufferPoolStats,

    config: BufferPoolConfig,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager with default sharding.
    ///
    /// # Panics
    /// Panics if `pool_size` is 0.
    pub fn new(pool_size: usize, store: DiskPageStore) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");
        Self::build(BufferPoolConfig::new(pool_size), store)
    }

    /// Create a buffer pool manager from a configuration.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the configuration is invalid.
    pub fn with_config(config: BufferPoolConfig, store: DiskPageStore) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, store))
    }

    fn build(config: BufferPoolConfig, store: DiskPageStore) -> Self {
        let pool_size = config.pool_size;

        // Allocate all frames upfront
        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();

        // All frames start free; reversed so frame 0 is handed out first
        let free_list: Vec<FrameId> = (0..pool_size).rev().map(FrameId::new).collect();

        debug!(
            "buffer pool created: {} frames, {} page table shards",
            pool_size, config.page_table_shards
        );

        Self {
            frames,
            page_table: PageTable::new(config.page_table_shards),
            free_list: Mutex::new(free_list),
            replacer: ClockReplacer::new(pool_size),
            fault_latch: Mutex::new(()),
            store,
            stats: BufferPoolStats::new(),
            config,
        }
    }

    // ========================================================================
    // Public API: Fetch pages
    // ========================================================================

    /// Fetch a page, pinning it and taking its content latch.
    ///
    /// With `write_intent` the latch is exclusive, otherwise shared. If the
    /// page is not resident it is loaded from disk, evicting an unpinned
    /// page if the pool is full.
    ///
    /// Blocks while another handle holds a conflicting latch on the page.
    ///
    /// # Errors
    /// - `Error::PoolExhausted` if the page is not resident and every frame
    ///   is pinned
    /// - `Error::PageOutOfRange` if the page's byte offset overflows; the
    ///   pool is not touched
    /// - `Error::Io` if loading the page or writing back a victim fails
    pub fn fetch_page(&self, page_id: PageId, write_intent: bool) -> Result<PageHandle<'_>> {
        let frame_id = self.pin_page(page_id)?;
        let frame = &self.frames[frame_id.0];

        // No pool-wide lock is held past this point.
        let handle = if write_intent {
            PageHandle::exclusive(self, frame_id, page_id, frame.write())
        } else {
            PageHandle::shared(self, frame_id, page_id, frame.read())
        };
        self.replacer.record_access(frame_id);

        Ok(handle)
    }

    /// Fetch a page for reading (shared access).
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageHandle<'_>> {
        self.fetch_page(page_id, false)
    }

    /// Fetch a page for writing (exclusive access).
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageHandle<'_>> {
        self.fetch_page(page_id, true)
    }

    // ========================================================================
    // Public API: Pins and flushing
    // ========================================================================

    /// Return a pin taken over with [`PageHandle::into_pin`].
    ///
    /// With `is_dirty` the page is marked dirty; the flag is sticky and only
    /// a flush clears it.
    ///
    /// Returns `Ok(false)` if the page is not resident.
    ///
    /// # Errors
    /// Returns `Error::PageNotPinned` if the pin count is already zero. The
    /// count is left at zero and the dirty flag is not touched.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> Result<bool> {
        let unpinned = self.page_table.with(&page_id, |&frame_id| {
            let frame = &self.frames[frame_id.0];
            let remaining = frame.try_unpin()?;
            // Eviction needs this shard's write lock, so the frame cannot be
            // unmapped before the flag lands even if the count hit zero.
            if is_dirty {
                frame.mark_dirty();
            }
            Some(remaining)
        });

        match unpinned {
            None => Ok(false),
            Some(Some(_)) => Ok(true),
            Some(None) => Err(Error::PageNotPinned(page_id)),
        }
    }

    /// Write a page to disk if it is dirty.
    ///
    /// Takes the page's exclusive content latch for the write, so it waits
    /// for outstanding handles on the page. Must not be called while the
    /// calling thread holds a handle on the same page.
    ///
    /// Returns `Ok(true)` if the page is resident (flushed or already clean)
    /// and `Ok(false)` if it is not.
    ///
    /// # Errors
    /// Returns `Error::Io` if the write fails; the page stays dirty.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        // Pin so the frame cannot be evicted and reused mid-flush
        let Some(frame_id) = self.try_pin_resident(page_id) else {
            return Ok(false);
        };
        let frame = &self.frames[frame_id.0];

        let result = self.write_back(frame, page_id);
        frame.try_unpin();

        result.map(|_| true)
    }

    /// Flush every dirty resident page.
    ///
    /// Each page is flushed under its own latch; order is unspecified.
    ///
    /// # Errors
    /// Returns the first I/O error; pages after it are not flushed.
    pub fn flush_all_pages(&self) -> Result<()> {
        for frame in &self.frames {
            if !frame.is_dirty() {
                continue;
            }
            if let Some(page_id) = frame.page_id() {
                self.flush_page(page_id)?;
            }
        }
        Ok(())
    }

    /// Drop a page from the buffer pool.
    ///
    /// The frame returns to the free list and any unflushed changes are
    /// discarded. Nothing on disk is touched.
    ///
    /// Returns `Ok(false)` if the page is not resident.
    ///
    /// # Errors
    /// Returns `Error::PagePinned` if the page is still pinned.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let _fault = self.fault_latch.lock();

        let Some(frame_id) = self.page_table.get(&page_id) else {
            return Ok(false);
        };
        let frame = &self.frames[frame_id.0];

        if self
            .page_table
            .remove_if(&page_id, |_| !frame.is_pinned())
            .is_none()
        {
            return Err(Error::PagePinned(page_id));
        }

        debug!("deleted {} from {}", page_id, frame_id);
        self.free_frame(frame_id);
        Ok(true)
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Occupancy snapshot: total, free, pinned and dirty frames.
    pub fn stats(&self) -> PoolStats {
        let free_frames = self.free_list.lock().len();
        let pinned_frames = self.frames.iter().filter(|f| f.is_pinned()).count();
        let dirty_frames = self
            .frames
            .iter()
            .filter(|f| f.is_dirty() && !f.is_free())
            .count();

        PoolStats {
            total_frames: self.frames.len(),
            free_frames,
            pinned_frames,
            dirty_frames,
        }
    }

    /// Activity counters (hits, misses, evictions, page I/O).
    pub fn counters(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    /// Get the configuration the pool was built with.
    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }

    /// Get the disk page store.
    pub fn store(&self) -> &DiskPageStore {
        &self.store
    }

    /// Get the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.free_list.lock().len()
    }

    /// Get the number of resident pages.
    pub fn page_count(&self) -> usize {
        self.page_table.len()
    }

    /// Check whether a page is resident.
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.page_table.contains_key(&page_id)
    }

    /// Pin count of a resident page, or `None` if it is not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        self.page_table
            .with(&page_id, |&frame_id| self.frames[frame_id.0].pin_count())
    }

    /// Dirty flag of a resident page, or `None` if it is not resident.
    pub fn is_dirty(&self, page_id: PageId) -> Option<bool> {
        self.page_table
            .with(&page_id, |&frame_id| self.frames[frame_id.0].is_dirty())
    }

    // ========================================================================
    // Internal: Called by PageHandle
    // ========================================================================

    #[inline]
    pub(crate) fn frame(&self, frame_id: FrameId) -> &Frame {
        &self.frames[frame_id.0]
    }

    /// Drop one pin. Returns the new count, or `None` on underflow.
    #[inline]
    pub(crate) fn release_pin(&self, frame_id: FrameId) -> Option<u32> {
        self.frames[frame_id.0].try_unpin()
    }

    // ========================================================================
    // Internal: Core fetch logic
    // ========================================================================

    /// Pin the frame holding `page_id`, loading the page if needed.
    fn pin_page(&self, page_id: PageId) -> Result<FrameId> {
        // Reject before touching the table or acquiring a frame
        if page_id.offset().is_none() {
            warn!("{} has no addressable offset", page_id);
            return Err(Error::PageOutOfRange(page_id));
        }

        // Fast path: shard read lock only
        if let Some(frame_id) = self.try_pin_resident(page_id) {
            trace!("hit {} in {}", page_id, frame_id);
            BufferPoolStats::bump(&self.stats.cache_hits);
            return Ok(frame_id);
        }

        self.handle_page_fault(page_id)
    }

    /// Pin a resident page atomically with its page table lookup.
    #[inline]
    fn try_pin_resident(&self, page_id: PageId) -> Option<FrameId> {
        self.page_table.with(&page_id, |&frame_id| {
            self.frames[frame_id.0].pin();
            frame_id
        })
    }

    /// Handle a miss: get a frame, load from disk, publish the mapping.
    fn handle_page_fault(&self, page_id: PageId) -> Result<FrameId> {
        let _fault = self.fault_latch.lock();

        // Another thread may have loaded the page while we waited
        if let Some(frame_id) = self.try_pin_resident(page_id) {
            trace!("{} loaded concurrently into {}", page_id, frame_id);
            BufferPoolStats::bump(&self.stats.cache_hits);
            return Ok(frame_id);
        }

        BufferPoolStats::bump(&self.stats.cache_misses);
        let frame_id = self.acquire_frame()?;

        let page = match self.store.read_page(page_id.file, page_id.page_no) {
            Ok(page) => page,
            Err(e) => {
                warn!("failed to load {}: {}", page_id, e);
                self.free_frame(frame_id);
                return Err(e);
            }
        };
        BufferPoolStats::bump(&self.stats.pages_read);

        // Not yet published, so nobody else can reach the frame
        self.frames[frame_id.0].install(page_id, &page);
        self.page_table.insert(page_id, frame_id);
        debug!("loaded {} into {}", page_id, frame_id);

        Ok(frame_id)
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Get a free frame, evicting if necessary. Caller holds `fault_latch`.
    fn acquire_frame(&self) -> Result<FrameId> {
        // Try the free list first
        if let Some(frame_id) = self.free_list.lock().pop() {
            return Ok(frame_id);
        }

        self.evict_page()
    }

    /// Evict a page and return its now-empty frame. Caller holds `fault_latch`.
    fn evict_page(&self) -> Result<FrameId> {
        // A selected victim can be pinned by a hit before we unmap it; pick
        // again in that case, at most once per frame.
        for _ in 0..self.frames.len() {
            let Some(frame_id) = self.replacer.select_victim(&self.frames) else {
                break;
            };
            let frame = &self.frames[frame_id.0];
            let Some(victim) = frame.page_id() else {
                continue;
            };

            if self
                .page_table
                .remove_if(&victim, |_| !frame.is_pinned())
                .is_none()
            {
                trace!("victim {} was pinned before unmapping", victim);
                continue;
            }

            // Unmapped and unpinned: this thread now owns the frame.
            if let Err(e) = self.write_back(frame, victim) {
                warn!("failed to write back victim {}: {}", victim, e);
                self.page_table.insert(victim, frame_id);
                return Err(e);
            }

            BufferPoolStats::bump(&self.stats.evictions);
            debug!("evicted {} from {}", victim, frame_id);

            self.replacer.remove(frame_id);
            frame.set_page_id(None);
            frame.clear_dirty();
            return Ok(frame_id);
        }

        warn!("buffer pool exhausted: all {} frames pinned", self.frames.len());
        Err(Error::PoolExhausted)
    }

    /// Write a frame's page to disk if it is dirty.
    ///
    /// Holds the exclusive content latch across the write so the image on
    /// disk is the image the dirty flag was cleared for.
    fn write_back(&self, frame: &Frame, page_id: PageId) -> Result<bool> {
        let page = frame.write();
        if !frame.is_dirty() {
            return Ok(false);
        }

        self.store
            .write_page(page_id.file, page_id.page_no, page.as_slice())?;
        frame.clear_dirty();
        drop(page);

        BufferPoolStats::bump(&self.stats.pages_written);
        trace!("flushed {}", page_id);
        Ok(true)
    }

    /// Return an unmapped, unpinned frame to the free list.
    fn free_frame(&self, frame_id: FrameId) {
        self.frames[frame_id.0].reset();
        self.replacer.remove(frame_id);
        self.free_list.lock().push(frame_id);
    }
}

impl std::fmt::Debug for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPoolManager")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::PAGE_SIZE;
    use crate::common::FileId;
    use tempfile::tempdir;

    /// Helper to create a BPM over a temporary page directory.
    fn create_test_bpm(pool_size: usize) -> (BufferPoolManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = DiskPageStore::open(dir.path()).unwrap();
        (BufferPoolManager::new(pool_size, store), dir)
    }

    fn pid(n: u64) -> PageId {
        PageId::new(FileId::new(1), n)
    }

    #[test]
    fn test_new_pool_is_all_free() {
        let (bpm, _dir) = create_test_bpm(4);

        assert_eq!(bpm.pool_size(), 4);
        assert_eq!(bpm.free_frame_count(), 4);
        assert_eq!(bpm.page_count(), 0);
        assert_eq!(
            bpm.stats(),
            PoolStats {
                total_frames: 4,
                free_frames: 4,
                pinned_frames: 0,
                dirty_frames: 0,
            }
        );
    }

    #[test]
    #[should_panic(expected = "pool_size must be > 0")]
    fn test_zero_pool_size_panics() {
        let _ = create_test_bpm(0);
    }

    #[test]
    fn test_with_config_rejects_invalid() {
        let dir = tempdir().unwrap();
        let store = DiskPageStore::open(dir.path()).unwrap();

        let result = BufferPoolManager::with_config(BufferPoolConfig::new(0), store);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_fetch_unwritten_page_is_zeroed() {
        let (bpm, _dir) = create_test_bpm(4);

        let handle = bpm.fetch_page_read(pid(0)).unwrap();
        assert!(handle.is_zeroed());
        assert_eq!(handle.as_slice().len(), PAGE_SIZE);
        assert!(!handle.is_writable());
    }

    #[test]
    fn test_fetch_page_write_then_read() {
        let (bpm, _dir) = create_test_bpm(4);

        {
            let mut handle = bpm.fetch_page_write(pid(0)).unwrap();
            handle.as_mut_slice().unwrap()[0] = 0xCD;
        }

        let handle = bpm.fetch_page_read(pid(0)).unwrap();
        assert_eq!(handle.as_slice()[0], 0xCD);
    }

    #[test]
    fn test_read_handle_has_no_mutable_access() {
        let (bpm, _dir) = create_test_bpm(4);

        let mut handle = bpm.fetch_page_read(pid(0)).unwrap();
        assert!(handle.page_mut().is_none());
        drop(handle);

        assert_eq!(bpm.is_dirty(pid(0)), Some(false));
    }

    #[test]
    fn test_cache_hit_counts() {
        let (bpm, _dir) = create_test_bpm(4);

        drop(bpm.fetch_page_read(pid(0)).unwrap());
        drop(bpm.fetch_page_read(pid(0)).unwrap());
        drop(bpm.fetch_page_read(pid(0)).unwrap());

        let snapshot = bpm.counters().snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 2);
        assert_eq!(snapshot.pages_read, 1);
    }

    #[test]
    fn test_pin_count_tracking() {
        let (bpm, _dir) = create_test_bpm(4);

        let first = bpm.fetch_page_read(pid(0)).unwrap();
        assert_eq!(bpm.get_pin_count(pid(0)), Some(1));

        let second = bpm.fetch_page_read(pid(0)).unwrap();
        assert_eq!(bpm.get_pin_count(pid(0)), Some(2));
        assert_eq!(first.frame_id(), second.frame_id());

        drop(first);
        assert_eq!(bpm.get_pin_count(pid(0)), Some(1));
        drop(second);
        assert_eq!(bpm.get_pin_count(pid(0)), Some(0));

        let frame = &bpm.frames[0];
        assert!(frame.is_evictable());
    }

    #[test]
    fn test_into_pin_and_unpin_page() {
        let (bpm, _dir) = create_test_bpm(4);

        let page_id = bpm.fetch_page_read(pid(3)).unwrap().into_pin();
        assert_eq!(page_id, pid(3));
        assert_eq!(bpm.get_pin_count(pid(3)), Some(1));

        // Latch is gone: a writer can get in while the pin is held
        drop(bpm.fetch_page_write(pid(3)).unwrap());
        assert_eq!(bpm.get_pin_count(pid(3)), Some(1));

        assert!(bpm.unpin_page(pid(3), false).unwrap());
        assert_eq!(bpm.get_pin_count(pid(3)), Some(0));
    }

    #[test]
    fn test_unpin_underflow_rejected() {
        let (bpm, _dir) = create_test_bpm(4);

        drop(bpm.fetch_page_read(pid(0)).unwrap());

        let result = bpm.unpin_page(pid(0), true);
        assert!(matches!(result, Err(Error::PageNotPinned(p)) if p == pid(0)));
        assert_eq!(bpm.get_pin_count(pid(0)), Some(0));
        // Rejected unpin does not mark the page dirty
        assert_eq!(bpm.is_dirty(pid(0)), Some(false));
    }

    #[test]
    fn test_unpin_not_resident() {
        let (bpm, _dir) = create_test_bpm(4);
        assert!(!bpm.unpin_page(pid(9), false).unwrap());
    }

    #[test]
    fn test_unpin_dirty_is_sticky() {
        let (bpm, _dir) = create_test_bpm(4);

        bpm.fetch_page_read(pid(0)).unwrap().into_pin();
        bpm.fetch_page_read(pid(0)).unwrap().into_pin();

        assert!(bpm.unpin_page(pid(0), true).unwrap());
        assert!(bpm.unpin_page(pid(0), false).unwrap());

        assert_eq!(bpm.is_dirty(pid(0)), Some(true));
    }

    #[test]
    fn test_write_handle_marks_dirty() {
        let (bpm, _dir) = create_test_bpm(4);

        {
            let mut handle = bpm.fetch_page_write(pid(0)).unwrap();
            handle.as_mut_slice().unwrap()[10] = 1;
        }

        assert_eq!(bpm.is_dirty(pid(0)), Some(true));
        assert_eq!(bpm.stats().dirty_frames, 1);
    }

    #[test]
    fn test_untouched_write_handle_stays_clean() {
        let (bpm, _dir) = create_test_bpm(4);

        drop(bpm.fetch_page_write(pid(0)).unwrap());

        assert_eq!(bpm.is_dirty(pid(0)), Some(false));
    }

    #[test]
    fn test_flush_page() {
        let (bpm, _dir) = create_test_bpm(4);

        {
            let mut handle = bpm.fetch_page_write(pid(0)).unwrap();
            handle.as_mut_slice().unwrap()[0] = 0xFF;
        }

        assert!(bpm.flush_page(pid(0)).unwrap());
        assert_eq!(bpm.is_dirty(pid(0)), Some(false));
        assert_eq!(bpm.get_pin_count(pid(0)), Some(0));
        assert_eq!(bpm.counters().snapshot().pages_written, 1);

        let on_disk = bpm.store().read_page(FileId::new(1), 0).unwrap();
        assert_eq!(on_disk.as_slice()[0], 0xFF);

        // Clean page: nothing to write
        assert!(bpm.flush_page(pid(0)).unwrap());
        assert_eq!(bpm.counters().snapshot().pages_written, 1);
    }

    #[test]
    fn test_flush_page_not_resident() {
        let (bpm, _dir) = create_test_bpm(4);
        assert!(!bpm.flush_page(pid(5)).unwrap());
    }

    #[test]
    fn test_flush_all_pages() {
        let (bpm, _dir) = create_test_bpm(8);

        for i in 0..5u64 {
            let mut handle = bpm.fetch_page_write(pid(i)).unwrap();
            handle.as_mut_slice().unwrap()[0] = i as u8 + 1;
        }
        assert_eq!(bpm.stats().dirty_frames, 5);

        bpm.flush_all_pages().unwrap();

        assert_eq!(bpm.stats().dirty_frames, 0);
        assert_eq!(bpm.counters().snapshot().pages_written, 5);
        for i in 0..5u64 {
            let page = bpm.store().read_page(FileId::new(1), i).unwrap();
            assert_eq!(page.as_slice()[0], i as u8 + 1);
        }
    }

    #[test]
    fn test_eviction() {
        let (bpm, _dir) = create_test_bpm(3);

        for i in 0..3 {
            drop(bpm.fetch_page_read(pid(i)).unwrap());
        }
        assert_eq!(bpm.free_frame_count(), 0);

        // One more page forces an eviction
        let handle = bpm.fetch_page_read(pid(3)).unwrap();
        assert_eq!(handle.page_id(), pid(3));
        assert_eq!(bpm.page_count(), 3);
        assert_eq!(bpm.counters().snapshot().evictions, 1);
    }

    #[test]
    fn test_dirty_page_flushed_on_eviction() {
        let (bpm, _dir) = create_test_bpm(1);

        {
            let mut handle = bpm.fetch_page_write(pid(0)).unwrap();
            handle.as_mut_slice().unwrap()[0] = 0x42;
        }

        // Loading page 1 evicts page 0, which must be written first
        drop(bpm.fetch_page_read(pid(1)).unwrap());
        assert!(!bpm.contains_page(pid(0)));

        let handle = bpm.fetch_page_read(pid(0)).unwrap();
        assert_eq!(handle.as_slice()[0], 0x42);
    }

    #[test]
    fn test_pool_exhausted() {
        let (bpm, _dir) = create_test_bpm(2);

        let _a = bpm.fetch_page_read(pid(0)).unwrap();
        let _b = bpm.fetch_page_read(pid(1)).unwrap();

        let result = bpm.fetch_page_read(pid(2));
        assert!(matches!(result, Err(Error::PoolExhausted)));

        // Failed fetch leaves no trace
        assert!(!bpm.contains_page(pid(2)));
        assert_eq!(bpm.stats().pinned_frames, 2);
    }

    #[test]
    fn test_resident_page_fetch_when_pool_pinned() {
        let (bpm, _dir) = create_test_bpm(1);

        let _a = bpm.fetch_page_read(pid(0)).unwrap();
        // Hits never need a frame
        let again = bpm.fetch_page_read(pid(0)).unwrap();
        assert_eq!(again.page_id(), pid(0));
    }

    #[test]
    fn test_delete_page() {
        let (bpm, _dir) = create_test_bpm(4);

        drop(bpm.fetch_page_read(pid(0)).unwrap());
        assert_eq!(bpm.page_count(), 1);

        assert!(bpm.delete_page(pid(0)).unwrap());

        assert_eq!(bpm.free_frame_count(), 4);
        assert_eq!(bpm.page_count(), 0);
        assert!(!bpm.contains_page(pid(0)));
        assert!(!bpm.delete_page(pid(0)).unwrap());
    }

    #[test]
    fn test_delete_pinned_page_fails() {
        let (bpm, _dir) = create_test_bpm(4);

        let _handle = bpm.fetch_page_read(pid(0)).unwrap();

        let result = bpm.delete_page(pid(0));
        assert!(matches!(result, Err(Error::PagePinned(p)) if p == pid(0)));
        assert!(bpm.contains_page(pid(0)));
    }

    #[test]
    fn test_load_failure_returns_frame() {
        let (bpm, _dir) = create_test_bpm(2);
        let bad = PageId::new(FileId::new(99), 0);

        // A directory where the page file should be makes reads fail
        std::fs::create_dir(bpm.store().file_path(bad.file)).unwrap();

        assert!(matches!(bpm.fetch_page_read(bad), Err(Error::Io(_))));
        assert_eq!(bpm.free_frame_count(), 2);
        assert!(!bpm.contains_page(bad));
    }

    #[test]
    fn test_victim_write_failure_keeps_page() {
        let (bpm, _dir) = create_test_bpm(1);
        let victim = PageId::new(FileId::new(50), 0);

        {
            let mut handle = bpm.fetch_page_write(victim).unwrap();
            handle.as_mut_slice().unwrap()[0] = 9;
        }

        // Block the victim's file so the write-back fails
        std::fs::create_dir(bpm.store().file_path(victim.file)).unwrap();

        assert!(matches!(bpm.fetch_page_read(pid(0)), Err(Error::Io(_))));

        // Victim is still resident and still dirty
        assert!(bpm.contains_page(victim));
        assert_eq!(bpm.is_dirty(victim), Some(true));
        let handle = bpm.fetch_page_read(victim).unwrap();
        assert_eq!(handle.as_slice()[0], 9);
    }

    #[test]
    fn test_out_of_range_page_keeps_pool_intact() {
        let (bpm, _dir) = create_test_bpm(2);

        {
            let mut handle = bpm.fetch_page_write(pid(0)).unwrap();
            handle.as_mut_slice().unwrap()[0] = 0xAA;
        }
        bpm.flush_page(pid(0)).unwrap();

        for page_no in [1u64 << 51, u64::MAX] {
            let far = pid(page_no);
            assert!(matches!(
                bpm.fetch_page_write(far),
                Err(Error::PageOutOfRange(p)) if p == far
            ));
            assert!(matches!(
                bpm.fetch_page_read(far),
                Err(Error::PageOutOfRange(_))
            ));
            assert!(!bpm.contains_page(far));
        }

        // No frame was consumed and no miss was counted
        assert_eq!(bpm.free_frame_count(), 1);
        assert_eq!(bpm.counters().snapshot().cache_misses, 1);

        // Both frames are still usable and page 0 is intact on disk
        drop(bpm.fetch_page_read(pid(1)).unwrap());
        drop(bpm.fetch_page_read(pid(2)).unwrap());
        let on_disk = bpm.store().read_page(FileId::new(1), 0).unwrap();
        assert_eq!(on_disk.as_slice()[0], 0xAA);
    }

    #[test]
    fn test_rejected_unpin_after_racing_unpins_leaves_page_clean() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        let (bpm, _dir) = create_test_bpm(2);
        let bpm = Arc::new(bpm);

        for _ in 0..50 {
            // One pin, two threads racing to return it; only one may succeed
            bpm.fetch_page_read(pid(0)).unwrap().into_pin();
            let barrier = Arc::new(Barrier::new(2));

            let racers: Vec<_> = [false, true]
                .into_iter()
                .map(|dirty| {
                    let bpm = Arc::clone(&bpm);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        (dirty, bpm.unpin_page(pid(0), dirty))
                    })
                })
                .collect();

            let results: Vec<_> = racers.into_iter().map(|r| r.join().unwrap()).collect();
            let winners = results.iter().filter(|(_, r)| matches!(r, Ok(true))).count();
            assert_eq!(winners, 1);

            // The dirty flag is set only if the dirty unpin was the one that counted
            let dirty_won = results.iter().any(|(dirty, r)| *dirty && matches!(r, Ok(true)));
            assert_eq!(bpm.is_dirty(pid(0)), Some(dirty_won));
            assert_eq!(bpm.get_pin_count(pid(0)), Some(0));

            bpm.delete_page(pid(0)).unwrap();
        }
    }

    #[test]
    fn test_concurrent_reads() {
        use std::sync::Arc;
        use std::thread;

        let (bpm, _dir) = create_test_bpm(4);
        let bpm = Arc::new(bpm);

        {
            let mut handle = bpm.fetch_page_write(pid(0)).unwrap();
            handle.as_mut_slice().unwrap()[0] = 0x42;
        }

        let mut handles = vec![];

        for _ in 0..10 {
            let bpm_clone = Arc::clone(&bpm);
            handles.push(thread::spawn(move || {
                let handle = bpm_clone.fetch_page_read(pid(0)).unwrap();
                assert_eq!(handle.as_slice()[0], 0x42);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(bpm.get_pin_count(pid(0)), Some(0));
    }
}
