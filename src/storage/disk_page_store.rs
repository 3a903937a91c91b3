//! Disk Page Store - low-level file I/O for database pages.
//!
//! The [`DiskPageStore`] is the only component that touches durable storage.
//! It reads and writes whole pages by byte offset, keeps no cache and knows
//! nothing about pinning.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, FileId, PageId, Result};
use crate::storage::page::Page;

/// Reads and writes fixed-size pages in a directory of page files.
///
/// # File Layout
/// Each [`FileId`] maps to one flat file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (8KB)   │ (8KB)   │ (8KB)   │         │ (8KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      8192    16384    ...    N×8192
/// ```
///
/// There is no header and no checksum. A page that was never written reads
/// as all zeros, and writing past the end of a file extends it sparsely.
///
/// # Thread Safety
/// The store is stateless: every call opens its own file handle, so it can
/// be shared by reference across threads without a lock.
///
/// # Durability
/// Every write is followed by `fsync()` before returning.
#[derive(Debug)]
pub struct DiskPageStore {
    root: PathBuf,
}

impl DiskPageStore {
    /// Open a page store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the page files.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the page file backing `file`.
    pub fn file_path(&self, file: FileId) -> PathBuf {
        self.root.join(format!("{:010}.pages", file.0))
    }

    /// Read one page from disk.
    ///
    /// A missing file, or a read that reaches end-of-file early, is not an
    /// error: the unread part of the page is zero-filled.
    ///
    /// # Errors
    /// - `Error::PageOutOfRange` if the page's offset overflows; no I/O is
    ///   attempted
    /// - `Error::Io` if the file exists but cannot be read
    pub fn read_page(&self, file: FileId, page_no: u64) -> Result<Page> {
        let page_id = PageId::new(file, page_no);
        let offset = page_offset(page_id)?;
        let mut page = Page::new();

        let mut f = match File::open(self.file_path(file)) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!("{} has no backing file, returning zeroed page", page_id);
                return Ok(page);
            }
            Err(e) => return Err(e.into()),
        };

        f.seek(SeekFrom::Start(offset))?;
        let filled = read_full(&mut f, page.as_mut_slice())?;
        if filled < PAGE_SIZE {
            trace!("{} short read of {} bytes, zero-filled", page_id, filled);
        }

        Ok(page)
    }

    /// Write one page to disk.
    ///
    /// Creates the file if it does not exist. The offset may lie beyond the
    /// current end of file.
    ///
    /// # Errors
    /// - `Error::InvalidPageLength` if `bytes` is not exactly one page; no
    ///   I/O is attempted
    /// - `Error::PageOutOfRange` if the page's offset overflows; no I/O is
    ///   attempted
    /// - `Error::Io` on any write or sync failure
    pub fn write_page(&self, file: FileId, page_no: u64, bytes: &[u8]) -> Result<()> {
        if bytes.len() != PAGE_SIZE {
            return Err(Error::InvalidPageLength {
                expected: PAGE_SIZE,
                actual: bytes.len(),
            });
        }

        let page_id = PageId::new(file, page_no);
        let offset = page_offset(page_id)?;
        let mut f = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.file_path(file))?;

        f.seek(SeekFrom::Start(offset))?;
        f.write_all(bytes)?;
        f.sync_all()?; // fsync for durability

        trace!("wrote {}", page_id);
        Ok(())
    }
}

/// Byte offset of `page_id`, or `Error::PageOutOfRange` if it overflows.
fn page_offset(page_id: PageId) -> Result<u64> {
    page_id.offset().ok_or(Error::PageOutOfRange(page_id))
}

/// Read into `buf` until it is full or the reader hits end-of-file.
///
/// Returns the number of bytes read. Bytes past that point are untouched.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
