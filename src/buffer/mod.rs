//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between callers and the
//! page files on disk. It manages a fixed pool of frames, each holding one
//! page.
//!
//! # Components
//! - [`BufferPoolManager`] - The main page cache
//! - [`Frame`] - A slot in the buffer pool holding a page + metadata
//! - [`PageHandle`] - RAII handle owning a pin and a content latch
//! - [`PageTable`] - Sharded page-to-frame map
//! - [`BufferPoolStats`] / [`PoolStats`] - Activity counters and occupancy
//! - [`replacer`] - Eviction policy

mod buffer_pool_manager;
mod config;
mod frame;
mod page_handle;
mod page_table;
pub mod replacer;
mod stats;

pub use buffer_pool_manager::BufferPoolManager;
pub use config::BufferPoolConfig;
pub use frame::Frame;
pub use page_handle::PageHandle;
pub use page_table::PageTable;
pub use stats::{BufferPoolStats, PoolStats, StatsSnapshot};
