//! Page identifier type.

use std::fmt;

use super::FileId;

/// Identifies a logical page across all page files.
///
/// A page is addressed by the file it lives in and its page number within
/// that file. Ordering is by file first, then page number.
///
/// # Example
/// ```
/// use pagepool::{FileId, PageId};
///
/// let a = PageId::new(FileId::new(1), 7);
/// let b = PageId::new(FileId::new(2), 0);
/// assert!(a < b);
/// assert_eq!(a.page_no, 7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    /// File holding the page.
    pub file: FileId,
    /// Page number within the file.
    pub page_no: u64,
}

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(file: FileId, page_no: u64) -> Self {
        PageId { file, page_no }
    }

    /// Byte offset of this page within its file, or `None` if it does not
    /// fit in a `u64`.
    #[inline]
    pub fn offset(&self) -> Option<u64> {
        self.page_no
            .checked_mul(crate::common::config::PAGE_SIZE as u64)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({}:{})", self.file.0, self.page_no)
    }
}
