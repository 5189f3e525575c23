//! Object Cache Module
//!
//! The owning cache: a set of named indexes over one object type, with
//! enable/disable, invalidation, select-through on miss and a consistency
//! sweep.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::cache::{CacheId, CacheIndex, CacheStats, Cacheable, IndexDefinition, ObjectIndex};
use crate::config::Config;
use crate::error::{CacheError, Result};

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

// == Object Cache ==
/// Cache of one object type, owning its indexes.
///
/// Not synchronized; share it behind a single lock held across each
/// read-verify or write sequence.
pub struct ObjectCache<T: Cacheable> {
    id: CacheId,
    name: String,
    enabled: bool,
    diagnostics: bool,
    indexes: Vec<Box<dyn ObjectIndex<T>>>,
    invalidations: u64,
    last_invalidated: Option<DateTime<Utc>>,
}

impl<T: Cacheable> ObjectCache<T> {
    // == Constructor ==
    /// Creates an enabled cache without indexes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CacheId(NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            enabled: true,
            diagnostics: false,
            indexes: Vec::new(),
            invalidations: 0,
            last_invalidated: None,
        }
    }

    /// Creates a cache with the enabled/diagnostics flags from `config`.
    pub fn from_config(name: impl Into<String>, config: &Config) -> Self {
        let mut cache = Self::new(name);
        cache.enabled = config.cache_enabled;
        cache.diagnostics = config.diagnostics;
        cache
    }

    pub fn id(&self) -> CacheId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the cache. Disabling drops all cached objects.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            self.invalidate();
        }
        self.enabled = enabled;
        info!(cache = %self.name, enabled, "cache state changed");
    }

    /// Turns statistics collection on or off for every index.
    pub fn set_diagnostics(&mut self, enabled: bool) {
        self.diagnostics = enabled;
        for index in &mut self.indexes {
            index.set_diagnostics(enabled);
        }
    }

    // == Index Management ==
    /// Takes ownership of an index.
    ///
    /// Fails if the index already belongs to a cache or its name is taken.
    pub fn add_index<D: IndexDefinition<T>>(&mut self, mut index: CacheIndex<T, D>) -> Result<()> {
        if self.find(index.name()).is_some() {
            return Err(CacheError::State(format!(
                "cache '{}' already has an index named '{}'",
                self.name,
                index.name()
            )));
        }
        index.assign_cache(Some(self.id))?;
        index.set_diagnostics(self.diagnostics);
        debug!(cache = %self.name, index = index.name(), "index added");
        self.indexes.push(Box::new(index));
        Ok(())
    }

    /// Releases and drops an index.
    pub fn remove_index(&mut self, name: &str) -> Result<()> {
        let position = self
            .indexes
            .iter()
            .position(|index| index.name() == name)
            .ok_or_else(|| unknown_index(&self.name, name))?;
        self.indexes[position].assign_cache(None)?;
        self.indexes.remove(position);
        debug!(cache = %self.name, index = name, "index removed");
        Ok(())
    }

    pub fn index_names(&self) -> Vec<&str> {
        self.indexes.iter().map(|index| index.name()).collect()
    }

    /// Typed access to a named index.
    pub fn index<D: IndexDefinition<T>>(&self, name: &str) -> Result<&CacheIndex<T, D>> {
        let index = self.find(name).ok_or_else(|| unknown_index(&self.name, name))?;
        index
            .as_any()
            .downcast_ref::<CacheIndex<T, D>>()
            .ok_or_else(|| wrong_definition(&self.name, name))
    }

    /// Typed mutable access to a named index.
    pub fn index_mut<D: IndexDefinition<T>>(&mut self, name: &str) -> Result<&mut CacheIndex<T, D>> {
        let cache = &self.name;
        let index = self
            .indexes
            .iter_mut()
            .find(|index| index.name() == name)
            .ok_or_else(|| unknown_index(cache, name))?;
        index
            .as_any_mut()
            .downcast_mut::<CacheIndex<T, D>>()
            .ok_or_else(|| wrong_definition(cache, name))
    }

    fn find(&self, name: &str) -> Option<&dyn ObjectIndex<T>> {
        self.indexes
            .iter()
            .find(|index| index.name() == name)
            .map(|index| index.as_ref())
    }

    // == Invalidate ==
    /// Drops every cached object and resets all statistics.
    pub fn invalidate(&mut self) {
        for index in &mut self.indexes {
            index.clear();
            index.reset_statistics();
        }
        self.invalidations += 1;
        self.last_invalidated = Some(Utc::now());
        info!(cache = %self.name, invalidations = self.invalidations, "cache invalidated");
    }

    /// Invalidates the whole cache when `result` reports corruption.
    fn guard<R>(&mut self, result: Result<R>) -> Result<R> {
        if let Err(err) = &result {
            if err.is_corruption() {
                error!(cache = %self.name, error = %err, "index corrupted, invalidating cache");
                self.invalidate();
            }
        }
        result
    }

    // == Insert ==
    /// Adds an object to every index.
    ///
    /// On failure the indexes updated so far are rolled back, putting back
    /// any object a non-unique index had overwritten.
    pub fn insert(&mut self, object: Arc<T>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut displaced = Vec::with_capacity(self.indexes.len());
        for position in 0..self.indexes.len() {
            match self.indexes[position].insert(Arc::clone(&object)) {
                Ok(previous) => displaced.push(previous),
                Err(err) => {
                    let updated = self.indexes[..position].iter_mut().zip(displaced);
                    for (index, previous) in updated {
                        match previous {
                            Some(previous) => index.restore(previous),
                            None => {
                                index.remove(&object);
                            }
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    // == Evict ==
    /// Removes an object from every index. Returns whether any entry was removed.
    pub fn evict(&mut self, object: &T) -> bool {
        self.indexes
            .iter_mut()
            .fold(false, |removed, index| index.remove(object) || removed)
    }

    /// Removes an object that must be cached in every index.
    ///
    /// Every index is visited even when one of them reports `NotFound`.
    pub fn evict_existing(&mut self, object: &T) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }

        let mut removed = false;
        let mut missing = None;
        for index in &mut self.indexes {
            match index.remove_existing(object) {
                Ok(done) => removed |= done,
                Err(err) => missing = missing.or(Some(err)),
            }
        }
        match missing {
            Some(err) => Err(err),
            None => Ok(removed),
        }
    }

    // == Lookups ==
    /// Point lookup in a named index. A disabled cache always misses.
    pub fn get<D: IndexDefinition<T>>(
        &mut self,
        index: &str,
        context: Option<&T::Context>,
        key: Option<&D::Key>,
    ) -> Result<Option<Arc<T>>> {
        if !self.enabled {
            return Ok(None);
        }
        let result = self.index_mut::<D>(index)?.get(context, key);
        self.guard(result)
    }

    /// Point lookup that falls through to the index's `select` on a miss and
    /// caches what it loads.
    pub fn load<D: IndexDefinition<T>>(
        &mut self,
        index: &str,
        context: Option<&T::Context>,
        key: Option<&D::Key>,
    ) -> Result<Option<Arc<T>>> {
        if let Some(object) = self.get::<D>(index, context, key)? {
            return Ok(Some(object));
        }
        let (Some(context), Some(key)) = (context, key) else {
            return Ok(None);
        };

        let loaded = self.index::<D>(index)?.select(context, key)?;
        let Some(object) = loaded.map(Arc::new) else {
            return Ok(None);
        };
        debug!(cache = %self.name, index, id = %object.id(), "selected on cache miss");
        self.insert(Arc::clone(&object))?;
        Ok(Some(object))
    }

    /// Range lookup in a named index, `from` inclusive, `to` exclusive.
    pub fn get_range<D: IndexDefinition<T>>(
        &mut self,
        index: &str,
        context: Option<&T::Context>,
        from: Option<&D::Key>,
        to: Option<&D::Key>,
    ) -> Result<Vec<Arc<T>>> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        let result = self.index::<D>(index)?.get_range(context, from, to);
        self.guard(result)
    }

    /// Every object of a named index, in key order.
    pub fn get_all(&mut self, index: &str) -> Result<Vec<Arc<T>>> {
        let result = self
            .find(index)
            .ok_or_else(|| unknown_index(&self.name, index))?
            .objects();
        self.guard(result)
    }

    // == Verify ==
    /// Consistency sweep over every index. Returns the number of verified
    /// entries.
    pub fn verify(&mut self) -> Result<usize> {
        let result = self
            .indexes
            .iter()
            .try_fold(0, |verified, index| -> Result<usize> {
                Ok(verified + index.objects()?.len())
            });
        self.guard(result)
    }

    // == Stats ==
    /// Returns a snapshot of the cache and its indexes.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            name: self.name.clone(),
            enabled: self.enabled,
            invalidations: self.invalidations,
            last_invalidated: self.last_invalidated.map(|at| at.to_rfc3339()),
            indexes: self.indexes.iter().map(|index| index.snapshot()).collect(),
        }
    }

    /// Number of entries in the named index.
    pub fn len(&self, index: &str) -> Result<usize> {
        self.find(index)
            .map(|index| index.len())
            .ok_or_else(|| unknown_index(&self.name, index))
    }
}

fn unknown_index(cache: &str, name: &str) -> CacheError {
    CacheError::NotFound(format!("cache '{}' has no index '{}'", cache, name))
}

fn wrong_definition(cache: &str, name: &str) -> CacheError {
    CacheError::State(format!(
        "index '{}' of cache '{}' has a different key definition",
        name, cache
    ))
}
