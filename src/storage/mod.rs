//! Storage layer - disk I/O and the page container.
//!
//! This module handles persistent storage:
//! - [`DiskPageStore`] - Whole-page file I/O
//! - [`page`] - The raw 8KB page type

mod disk_page_store;
pub mod page;

pub use disk_page_store::DiskPageStore;
