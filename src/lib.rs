//! pagepool - a concurrent page cache over fixed-size on-disk pages.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           callers                               │
//! │        fetch_page → PageHandle (pin + content latch)            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Buffer Pool (buffer/)                       │   │
//! │  │   BufferPoolManager + Frame + PageTable + Statistics     │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │        Eviction Policy: CLOCK (replacer/)        │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │        DiskPageStore + Page (one file per FileId)        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FileId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool management and eviction
//! - [`storage`] - Disk I/O and the page container
//!
//! # Quick Start
//! ```no_run
//! use pagepool::{BufferPoolManager, DiskPageStore, FileId, PageId};
//!
//! let store = DiskPageStore::open("data").unwrap();
//! let bpm = BufferPoolManager::new(64, store);
//!
//! let page_id = PageId::new(FileId::new(1), 0);
//! {
//!     let mut handle = bpm.fetch_page_write(page_id).unwrap();
//!     handle.as_mut_slice().unwrap()[0] = 0xAB;
//! }
//! bpm.flush_page(page_id).unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

pub use buffer::{
    BufferPoolConfig, BufferPoolManager, BufferPoolStats, PageHandle, PoolStats, StatsSnapshot,
};
pub use common::config::PAGE_SIZE;
pub use common::{Error, FileId, FrameId, PageId, Result};
pub use storage::page::Page;
pub use storage::DiskPageStore;
