//! Page table - a sharded concurrent map from page id to frame id.
//!
//! The table is split into a fixed number of shards, each a `HashMap`
//! behind its own `RwLock`. A key always lives in the shard chosen by its
//! hash, so two threads only contend when their keys land in the same shard.
//!
//! ```text
//!           hash(key) % shards
//!                  │
//!   ┌──────────┬───┴──────┬──────────┬──────────┐
//!   │ shard 0  │ shard 1  │ shard 2  │   ...    │
//!   │ RwLock   │ RwLock   │ RwLock   │          │
//!   │ HashMap  │ HashMap  │ HashMap  │          │
//!   └──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! Shard locks are leaves: callbacks run under a shard lock must not take
//! any other lock or perform I/O.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use parking_lot::RwLock;

/// A concurrent hash map split into independently locked shards.
pub struct PageTable<K, V> {
    shards: Box<[RwLock<HashMap<K, V>>]>,
    hasher: RandomState,
}

impl<K, V> PageTable<K, V>
where
    K: Eq + Hash,
{
    /// Create a table with `shard_count` shards.
    ///
    /// # Panics
    /// Panics if `shard_count` is 0.
    pub fn new(shard_count: usize) -> Self {
        assert!(shard_count > 0, "shard_count must be > 0");

        let shards = (0..shard_count)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    #[inline]
    fn shard(&self, key: &K) -> &RwLock<HashMap<K, V>> {
        let index = self.hasher.hash_one(key) as usize % self.shards.len();
        &self.shards[index]
    }

    /// Look up a key, returning a copy of its value.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Copy,
    {
        self.shard(key).read().get(key).copied()
    }

    /// Run `f` on the value for `key` while its shard's read lock is held.
    ///
    /// Lets a caller act on an entry (e.g. pin a frame) atomically with
    /// respect to writers of the same shard.
    pub fn with<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.shard(key).read().get(key).map(f)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.shard(key).read().contains_key(key)
    }

    /// Insert a key, replacing and returning any previous value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.shard(&key).write().insert(key, value)
    }

    /// Remove a key, returning its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.shard(key).write().remove(key)
    }

    /// Remove a key only if `pred` holds for its value.
    ///
    /// The predicate runs under the shard's write lock, so no reader of the
    /// same shard can observe the entry between the check and the removal.
    /// Returns the removed value, or `None` if the key was absent or the
    /// predicate failed.
    pub fn remove_if(&self, key: &K, pred: impl FnOnce(&V) -> bool) -> Option<V> {
        let mut shard = self.shard(key).write();
        match shard.get(key) {
            Some(value) if pred(value) => shard.remove(key),
            _ => None,
        }
    }

    /// Total number of entries.
    ///
    /// Shards are counted one at a time, so the result is only a snapshot.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Check whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Number of shards.
    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}
