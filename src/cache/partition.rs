//! A single named cache partition.

use std::collections::HashMap;

use crate::cache::{CacheEntry, RequestKey};

/// A named, versioned group of request/response snapshots.
///
/// Entries never expire individually; the whole partition is dropped when a
/// newer version activates.
#[derive(Debug, Default)]
pub struct CachePartition {
    pub name: String,
    entries: HashMap<RequestKey, CacheEntry>,
}

impl CachePartition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &RequestKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Stores an entry; the last write for a key wins.
    pub fn put(&mut self, key: RequestKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    pub fn delete(&mut self, key: &RequestKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Stored keys in a stable order.
    pub fn keys(&self) -> Vec<&RequestKey> {
        let mut keys: Vec<&RequestKey> = self.entries.keys().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
