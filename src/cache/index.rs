//! Cache Index Module
//!
//! One named, ordered view over cached objects, keyed by `(context, key)`.
//! Every read re-derives the key of the object it returns and fails loudly
//! when the object was mutated behind the index's back.

use std::any::Any;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{BusinessKey, Cacheable, CompositeKey, IndexSnapshot, IndexStats};
use crate::error::{CacheError, Result};

// == Cache Id ==
/// Identity of the cache that owns an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheId(pub(crate) u64);

impl fmt::Display for CacheId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache-{}", self.0)
    }
}

// == Index Definition ==
/// Per-type extension points of an index.
pub trait IndexDefinition<T: Cacheable>: Send + Sync + 'static {
    type Key: BusinessKey;

    /// Derives the business key of an object. `None` means the object can't
    /// be indexed (yet), it is never an error.
    fn extract(&self, object: &T) -> Option<Self::Key>;

    /// Loads an object from the authoritative store. Called by the owning
    /// cache on a miss, never by the index itself.
    fn select(&self, context: &T::Context, key: &Self::Key) -> Result<Option<T>>;

    /// Whether the owning cache inserts with [`CacheIndex::add_unique`].
    fn unique(&self) -> bool {
        true
    }
}

type IndexKey<T, D> = CompositeKey<<T as Cacheable>::Context, <D as IndexDefinition<T>>::Key>;

// == Cache Index ==
/// Ordered mapping from composite key to cached object.
///
/// Not synchronized; the owning cache serializes access.
pub struct CacheIndex<T: Cacheable, D: IndexDefinition<T>> {
    /// Diagnostic name
    name: String,
    definition: D,
    entries: BTreeMap<IndexKey<T, D>, Arc<T>>,
    stats: IndexStats,
    /// Collect access/miss counters
    diagnostics: bool,
    owner: Option<CacheId>,
}

impl<T: Cacheable, D: IndexDefinition<T>> fmt::Debug for CacheIndex<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheIndex")
            .field("name", &self.name)
            .field("entries", &self.entries.len())
            .field("stats", &self.stats)
            .field("owner", &self.owner)
            .finish()
    }
}

impl<T: Cacheable, D: IndexDefinition<T>> CacheIndex<T, D> {
    // == Constructor ==
    /// Creates an empty, unassigned index.
    pub fn new(name: impl Into<String>, definition: D) -> Self {
        Self {
            name: name.into(),
            definition,
            entries: BTreeMap::new(),
            stats: IndexStats::new(),
            diagnostics: false,
            owner: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &D {
        &self.definition
    }

    // == Extension Points ==
    /// Loads an object from the authoritative store.
    pub fn select(&self, context: &T::Context, key: &D::Key) -> Result<Option<T>> {
        self.definition.select(context, key)
    }

    /// Derives the business key of an object.
    pub fn extract(&self, object: &T) -> Option<D::Key> {
        self.definition.extract(object)
    }

    fn key_of(&self, object: &T) -> Result<IndexKey<T, D>> {
        CompositeKey::new(object.context(), self.extract(object))
    }

    fn lookup_key(
        &self,
        context: Option<&T::Context>,
        key: Option<&D::Key>,
    ) -> Result<IndexKey<T, D>> {
        CompositeKey::new(context.cloned(), key.cloned())
    }

    // == Ownership ==
    /// Assigns the index to a cache, or releases it with `None`.
    ///
    /// Fails when assigning an owned index or releasing an unowned one.
    pub fn assign_cache(&mut self, cache: Option<CacheId>) -> Result<()> {
        match (self.owner, cache) {
            (Some(current), Some(next)) => Err(CacheError::State(format!(
                "index '{}' already assigned to {}, cannot assign to {}",
                self.name, current, next
            ))),
            (None, None) => Err(CacheError::State(format!(
                "index '{}' is not assigned to any cache",
                self.name
            ))),
            (_, next) => {
                self.owner = next;
                Ok(())
            }
        }
    }

    pub fn owner(&self) -> Option<CacheId> {
        self.owner
    }

    // == Size ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Statistics ==
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    pub fn set_diagnostics(&mut self, enabled: bool) {
        self.diagnostics = enabled;
    }

    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }

    pub fn snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            name: self.name.clone(),
            entries: self.entries.len(),
            unique: self.definition.unique(),
            diagnostics: self.diagnostics,
            access_count: self.stats.access_count,
            miss_count: self.stats.miss_count,
            hit_rate_percent: self.stats.hit_rate_percent(),
        }
    }

    // == Verification ==
    /// Checks that `object` still maps to the key it is stored under.
    fn verify(&self, stored: &IndexKey<T, D>, object: &T) -> Result<()> {
        let current = self.key_of(object);
        if matches!(&current, Ok(key) if key == stored) {
            return Ok(());
        }

        let found = match current {
            Ok(key) => key.to_string(),
            Err(_) => "<no key>".to_string(),
        };
        warn!(
            index = %self.name,
            kind = object.kind(),
            id = %object.id(),
            expected = %stored,
            found = %found,
            "cached object no longer matches its index key"
        );
        Err(CacheError::Corruption {
            index: self.name.clone(),
            kind: object.kind().to_string(),
            id: object.id(),
            expected: stored.to_string(),
            found,
        })
    }

    // == Get ==
    /// Looks up one object.
    ///
    /// A missing context or key is logged and reported as absent. A hit whose
    /// object no longer derives the same key fails with `Corruption`.
    pub fn get(
        &mut self,
        context: Option<&T::Context>,
        key: Option<&D::Key>,
    ) -> Result<Option<Arc<T>>> {
        let lookup = match self.lookup_key(context, key) {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!(index = %self.name, error = %err, "lookup with malformed key");
                return Ok(None);
            }
        };

        if self.diagnostics {
            self.stats.record_access();
        }

        match self.entries.get(&lookup) {
            Some(object) => {
                self.verify(&lookup, object)?;
                Ok(Some(Arc::clone(object)))
            }
            None => {
                if self.diagnostics {
                    self.stats.record_miss();
                    debug!(index = %self.name, key = %lookup, "cache miss");
                }
                Ok(None)
            }
        }
    }

    // == Get All ==
    /// Returns every object in key order, verifying each one.
    pub fn get_all(&self) -> Result<Vec<Arc<T>>> {
        self.entries
            .iter()
            .map(|(key, object)| -> Result<Arc<T>> {
                self.verify(key, object)?;
                Ok(Arc::clone(object))
            })
            .collect()
    }

    // == Get Range ==
    /// Returns objects with keys in `[(context, from), (context, to))`.
    ///
    /// Malformed bounds are logged and yield an empty result.
    pub fn get_range(
        &self,
        context: Option<&T::Context>,
        from: Option<&D::Key>,
        to: Option<&D::Key>,
    ) -> Result<Vec<Arc<T>>> {
        let bounds = self
            .lookup_key(context, from)
            .and_then(|start| Ok((start, self.lookup_key(context, to)?)));
        let (start, end) = match bounds {
            Ok(bounds) => bounds,
            Err(err) => {
                warn!(index = %self.name, error = %err, "range lookup with malformed bound");
                return Ok(Vec::new());
            }
        };
        if start > end {
            debug!(index = %self.name, from = %start, to = %end, "empty range");
            return Ok(Vec::new());
        }

        self.entries
            .range(start..end)
            .map(|(key, object)| -> Result<Arc<T>> {
                self.verify(key, object)?;
                Ok(Arc::clone(object))
            })
            .collect()
    }

    // == Add ==
    /// Inserts or replaces the entry for `object`.
    ///
    /// Returns true when the key was not present before. Objects without a
    /// derivable key are logged and not added.
    pub fn add(&mut self, object: Arc<T>) -> bool {
        match self.replace(Arc::clone(&object)) {
            Ok(previous) => previous.is_none(),
            Err(err) => {
                self.log_unindexable(&object, &err);
                false
            }
        }
    }

    /// Inserts or replaces, handing back the object previously stored at the key.
    fn replace(&mut self, object: Arc<T>) -> Result<Option<Arc<T>>> {
        let key = self.key_of(&object)?;
        Ok(self.entries.insert(key, object))
    }

    // == Add Unique ==
    /// Inserts `object`, failing with `UniqueViolation` if its key is taken.
    ///
    /// The existing entry is left untouched on failure.
    pub fn add_unique(&mut self, object: Arc<T>) -> Result<bool> {
        let key = match self.key_of(&object) {
            Ok(key) => key,
            Err(err) => {
                self.log_unindexable(&object, &err);
                return Ok(false);
            }
        };

        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(object);
                Ok(true)
            }
            Entry::Occupied(slot) => Err(CacheError::UniqueViolation {
                index: self.name.clone(),
                key: slot.key().to_string(),
            }),
        }
    }

    // == Remove ==
    /// Removes the entry at `object`'s key. Returns whether one was removed.
    pub fn remove(&mut self, object: &T) -> bool {
        match self.key_of(object) {
            Ok(key) => self.entries.remove(&key).is_some(),
            Err(err) => {
                self.log_unindexable(object, &err);
                false
            }
        }
    }

    /// Like [`remove`](Self::remove) but the object must have been cached.
    pub fn remove_existing(&mut self, object: &T) -> Result<bool> {
        let key = match self.key_of(object) {
            Ok(key) => key,
            Err(err) => {
                self.log_unindexable(object, &err);
                return Ok(false);
            }
        };

        if self.entries.remove(&key).is_none() {
            return Err(CacheError::NotFound(format!(
                "{} {} not cached in index '{}' under {}",
                object.kind(),
                object.id(),
                self.name,
                key
            )));
        }
        Ok(true)
    }

    fn log_unindexable(&self, object: &T, err: &CacheError) {
        warn!(
            index = %self.name,
            kind = object.kind(),
            id = %object.id(),
            error = %err,
            "object has no usable index key"
        );
    }
}

// == Object Index ==
/// Type-erased view of an index, used by the owning cache to fan writes and
/// invalidation out over indexes with different key types.
pub trait ObjectIndex<T: Cacheable>: Send + Sync {
    fn name(&self) -> &str;
    fn len(&self) -> usize;
    fn unique(&self) -> bool;

    /// Adds with the index's uniqueness policy. Returns the object that was
    /// overwritten, which only a non-unique index can do.
    fn insert(&mut self, object: Arc<T>) -> Result<Option<Arc<T>>>;
    /// Puts back an object displaced by [`insert`](ObjectIndex::insert).
    fn restore(&mut self, object: Arc<T>);
    fn remove(&mut self, object: &T) -> bool;
    fn remove_existing(&mut self, object: &T) -> Result<bool>;

    /// Verified, ordered contents.
    fn objects(&self) -> Result<Vec<Arc<T>>>;

    fn clear(&mut self);
    fn reset_statistics(&mut self);
    fn set_diagnostics(&mut self, enabled: bool);
    fn assign_cache(&mut self, cache: Option<CacheId>) -> Result<()>;
    fn snapshot(&self) -> IndexSnapshot;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Cacheable, D: IndexDefinition<T>> ObjectIndex<T> for CacheIndex<T, D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn unique(&self) -> bool {
        self.definition.unique()
    }

    fn insert(&mut self, object: Arc<T>) -> Result<Option<Arc<T>>> {
        if self.definition.unique() {
            return self.add_unique(object).map(|_| None);
        }
        match self.replace(Arc::clone(&object)) {
            Ok(previous) => Ok(previous),
            Err(err) => {
                self.log_unindexable(&object, &err);
                Ok(None)
            }
        }
    }

    fn restore(&mut self, object: Arc<T>) {
        self.add(object);
    }

    fn remove(&mut self, object: &T) -> bool {
        CacheIndex::remove(self, object)
    }

    fn remove_existing(&mut self, object: &T) -> Result<bool> {
        CacheIndex::remove_existing(self, object)
    }

    fn objects(&self) -> Result<Vec<Arc<T>>> {
        self.get_all()
    }

    fn clear(&mut self) {
        CacheIndex::clear(self)
    }

    fn reset_statistics(&mut self) {
        CacheIndex::reset_statistics(self)
    }

    fn set_diagnostics(&mut self, enabled: bool) {
        CacheIndex::set_diagnostics(self, enabled)
    }

    fn assign_cache(&mut self, cache: Option<CacheId>) -> Result<()> {
        CacheIndex::assign_cache(self, cache)
    }

    fn snapshot(&self) -> IndexSnapshot {
        CacheIndex::snapshot(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
