//! Cache Registry Module
//!
//! Owns every named partition: creation on open, lookup, writes and
//! version-based pruning.

use std::collections::HashMap;

use tracing::{debug, info};
use url::Url;

use crate::cache::{CacheEntry, CachePartition, CacheStats, RequestKey};
use crate::fetch::{Request, Response};

// == Cache Registry ==
/// All cache partitions known to the worker.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    partitions: HashMap<String, CachePartition>,
    stats: CacheStats,
}

impl CacheRegistry {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Open ==
    /// Returns the named partition, creating it empty if it does not exist.
    pub fn open(&mut self, name: &str) -> &mut CachePartition {
        self.partitions.entry(name.to_string()).or_insert_with(|| {
            debug!("Created cache partition {}", name);
            CachePartition::new(name)
        })
    }

    pub fn has(&self, name: &str) -> bool {
        self.partitions.contains_key(name)
    }

    // == Match ==
    /// Looks up a request in one partition.
    ///
    /// Looking up in a partition that does not exist is a miss; it does not
    /// create the partition.
    pub fn match_request(&mut self, name: &str, request: &Request) -> Option<Response> {
        self.match_key(name, &RequestKey::from(request))
    }

    /// Looks up a GET of `url` in one partition.
    pub fn match_url(&mut self, name: &str, url: &Url) -> Option<Response> {
        self.match_key(name, &RequestKey::get(url))
    }

    fn match_key(&mut self, name: &str, key: &RequestKey) -> Option<Response> {
        let found = self
            .partitions
            .get(name)
            .and_then(|partition| partition.get(key))
            .map(CacheEntry::to_response);

        if found.is_some() {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        found
    }

    // == Put ==
    /// Stores a response snapshot under `key`, creating the partition if needed.
    pub fn put(&mut self, name: &str, key: RequestKey, response: &Response) {
        let entry = CacheEntry::from_response(response);
        self.open(name).put(key, entry);
        self.stats.record_store();
    }

    // == Delete ==
    pub fn delete(&mut self, name: &str) -> bool {
        let removed = self.partitions.remove(name).is_some();
        if removed {
            self.stats.record_partition_deleted();
        }
        removed
    }

    // == Delete All Except ==
    /// Deletes every partition that carries one of `prefixes` but is not in
    /// `current`. Partitions with unrelated names are never touched.
    ///
    /// Returns the deleted names, sorted.
    pub fn delete_all_except(&mut self, prefixes: &[&str], current: &[&str]) -> Vec<String> {
        let mut stale: Vec<String> = self
            .partitions
            .keys()
            .filter(|name| prefixes.iter().any(|prefix| name.starts_with(prefix)))
            .filter(|name| !current.contains(&name.as_str()))
            .cloned()
            .collect();
        stale.sort();

        for name in &stale {
            info!("Deleting old cache partition: {}", name);
            self.delete(name);
        }
        stale
    }

    /// Partition names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut names: Vec<String> = self.partitions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of entries in a partition (0 if absent).
    pub fn len(&self, name: &str) -> usize {
        self.partitions.get(name).map_or(0, CachePartition::len)
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }
}
