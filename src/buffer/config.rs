//! Buffer pool configuration.

use crate::common::config::{DEFAULT_PAGE_TABLE_SHARDS, DEFAULT_POOL_SIZE, PAGE_SIZE};
use crate::common::{Error, Result};

/// Configuration for a [`BufferPoolManager`](crate::BufferPoolManager).
///
/// # Example
/// ```
/// use pagepool::BufferPoolConfig;
///
/// let config = BufferPoolConfig::new(64).with_page_table_shards(8);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.memory_usage(), 64 * 8192);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub pool_size: usize,
    /// Number of independently locked page table shards.
    pub page_table_shards: usize,
}

impl BufferPoolConfig {
    /// Create a configuration with `pool_size` frames and default sharding.
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            page_table_shards: DEFAULT_PAGE_TABLE_SHARDS,
        }
    }

    /// Sets the number of page table shards.
    pub fn with_page_table_shards(mut self, shards: usize) -> Self {
        self.page_table_shards = shards;
        self
    }

    /// Bytes of page memory the pool will allocate.
    pub fn memory_usage(&self) -> usize {
        self.pool_size * PAGE_SIZE
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if any value is zero.
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::InvalidConfig("pool_size must be > 0"));
        }
        if self.page_table_shards == 0 {
            return Err(Error::InvalidConfig("page_table_shards must be > 0"));
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}
