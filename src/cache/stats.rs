//! Cache Statistics Module
//!
//! Tracks per-index access and miss counters plus serializable snapshots.

use serde::Serialize;

// == Index Stats ==
/// Access/miss counters of one index.
///
/// Counters only move while the index has diagnostics enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Number of point lookups
    pub access_count: u64,
    /// Number of point lookups that found nothing
    pub miss_count: u64,
}

impl IndexStats {
    // == Constructor ==
    /// Creates a new IndexStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Percentage of lookups that were hits.
    ///
    /// Computed as `100 - misses * 100 / max(accesses, 1)`, so an index that
    /// was never queried reports 100.
    pub fn hit_rate_percent(&self) -> u64 {
        let accesses = u128::from(self.access_count.max(1));
        let miss_percent = u128::from(self.miss_count) * 100 / accesses;
        100u64.saturating_sub(u64::try_from(miss_percent).unwrap_or(u64::MAX))
    }

    pub fn record_access(&mut self) {
        self.access_count += 1;
    }

    pub fn record_miss(&mut self) {
        self.miss_count += 1;
    }

    // == Reset ==
    /// Zeroes both counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Snapshots ==
/// Point-in-time view of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSnapshot {
    pub name: String,
    pub entries: usize,
    pub unique: bool,
    pub diagnostics: bool,
    pub access_count: u64,
    pub miss_count: u64,
    pub hit_rate_percent: u64,
}

/// Point-in-time view of a whole cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub name: String,
    pub enabled: bool,
    /// Number of times the cache was invalidated
    pub invalidations: u64,
    /// RFC 3339 time of the last invalidation
    pub last_invalidated: Option<String>,
    pub indexes: Vec<IndexSnapshot>,
}

impl CacheStats {
    /// Looks up the snapshot of a named index.
    pub fn index(&self, name: &str) -> Option<&IndexSnapshot> {
        self.indexes.iter().find(|i| i.name == name)
    }
}
