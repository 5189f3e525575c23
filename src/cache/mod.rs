//! Cache Module
//!
//! Context-aware object caching: composite keys, verified ordered indexes and
//! the cache that owns them.

mod index;
mod key;
mod stats;
mod store;

#[cfg(test)]
mod fixtures;


// Re-export public types
pub use index::{CacheId, CacheIndex, IndexDefinition, ObjectIndex};
pub use key::{BusinessKey, CacheContext, Cacheable, CompositeKey};
pub use stats::{CacheStats, IndexSnapshot, IndexStats};
pub use store::ObjectCache;
