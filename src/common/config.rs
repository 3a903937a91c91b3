//! Configuration constants for pagepool.

/// Size of a page in bytes (8KB).
///
/// Every page on disk and in memory is exactly this size. Partial pages are
/// never written or returned.
///
/// # Memory Layout
/// With 8KB pages and 64-bit page numbers, page `N` of a file occupies the
/// byte range `[N × 8192, (N + 1) × 8192)`.
pub const PAGE_SIZE: usize = 8192;

/// Alignment of an in-memory [`Page`](crate::storage::page::Page).
pub const PAGE_ALIGN: usize = 4096;

/// Default number of frames in a buffer pool.
pub const DEFAULT_POOL_SIZE: usize = 128;

/// Default number of independently locked page table shards.
pub const DEFAULT_PAGE_TABLE_SHARDS: usize = 16;
