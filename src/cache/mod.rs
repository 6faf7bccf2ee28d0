//! Cache Module
//!
//! Named, versioned cache partitions shared by every event handler.

mod entry;
mod names;
mod partition;
mod registry;
mod stats;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry, RequestKey};
pub use names::PartitionNames;
pub use partition::CachePartition;
pub use registry::CacheRegistry;
pub use stats::CacheStats;

/// The registry as shared between concurrently running handlers.
///
/// Every lock acquisition is a suspension point; writes for the same key are
/// last-write-wins.
pub type SharedRegistry = Arc<RwLock<CacheRegistry>>;

/// Creates an empty shared registry.
pub fn shared_registry() -> SharedRegistry {
    Arc::new(RwLock::new(CacheRegistry::new()))
}
