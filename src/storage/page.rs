//! The in-memory page container.
//!
//! A [`Page`] is exactly [`PAGE_SIZE`] bytes and is the only unit the disk
//! page store and the buffer pool move around. Its contents are opaque here.

use std::fmt;

use crate::common::config::PAGE_SIZE;

/// One page of bytes, aligned for direct I/O.
///
/// Not `Clone`: an 8KB copy should be spelled out with [`Page::copy_from`].
///
/// # Example
/// ```
/// use pagepool::Page;
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 0xFF;
/// assert_eq!(page.as_slice()[0], 0xFF);
/// assert!(!page.is_zeroed());
/// ```
#[repr(align(4096))]
pub struct Page {
    bytes: [u8; PAGE_SIZE],
}

impl Page {
    /// A page of zeros.
    #[inline]
    pub fn new() -> Self {
        Self {
            bytes: [0u8; PAGE_SIZE],
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Overwrite every byte with the bytes of `other`.
    #[inline]
    pub fn copy_from(&mut self, other: &Page) {
        self.bytes = other.bytes;
    }

    /// Zero the page.
    pub fn reset(&mut self) {
        self.bytes.fill(0);
    }

    pub fn is_zeroed(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.bytes[..] == other.bytes[..]
    }
}

impl Eq for Page {}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Printing 8KB is never useful; show the head and whether it is blank
        f.debug_struct("Page")
            .field("head", &&self.bytes[..8])
            .field("zeroed", &self.is_zeroed())
            .finish()
    }
}
