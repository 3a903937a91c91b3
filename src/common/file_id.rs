//! File identifier type.

use std::fmt;

/// Identifies one page file (a table or segment) on disk.
///
/// The [`DiskPageStore`](crate::storage::DiskPageStore) maps each id to a
/// file inside its root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    /// Create a new FileId.
    #[inline]
    pub fn new(id: u32) -> Self {
        FileId(id)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}
