//! Error types for pagepool.

use thiserror::Error;

use crate::common::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagepool.
///
/// Every failure is returned to the immediate caller. Nothing is retried
/// behind its back.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the disk page store.
    ///
    /// The in-memory state of the frame involved is left as it was before
    /// the call.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A page write was attempted with a buffer that is not exactly one page.
    ///
    /// Rejected before any I/O is attempted.
    #[error("invalid page length: expected {expected} bytes, got {actual}")]
    InvalidPageLength { expected: usize, actual: usize },

    /// Every frame in the buffer pool is pinned, so no page can be loaded.
    ///
    /// Recoverable: retry after other handles are released, or use a larger
    /// pool.
    #[error("buffer pool exhausted: every frame is pinned")]
    PoolExhausted,

    /// The page's byte offset does not fit in a `u64`.
    ///
    /// Rejected before any I/O or frame acquisition.
    #[error("{0} is beyond the addressable range of a page file")]
    PageOutOfRange(PageId),

    /// Attempted to unpin a page whose pin count is already zero.
    ///
    /// This indicates a bug - unpinning should match pinning.
    #[error("{0} is not pinned")]
    PageNotPinned(PageId),

    /// Attempted to delete a page that is still pinned.
    #[error("{0} is pinned")]
    PagePinned(PageId),

    /// A buffer pool configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
