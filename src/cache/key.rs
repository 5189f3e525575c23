//! Composite Key Module
//!
//! Defines the two-part `(context, business key)` identity every index is
//! ordered by, plus the traits cached objects and their contexts implement.

use std::cell::Cell;
use std::fmt;

use crate::error::{CacheError, Result};

// == Context ==
/// Session/tenant scope a cached object belongs to.
///
/// Objects in different contexts are never the same cache entry, even when
/// their business keys match.
pub trait CacheContext: Ord + Clone + fmt::Debug + Send + Sync + 'static {
    /// Short description used in diagnostics.
    fn info(&self) -> String;
}

impl CacheContext for String {
    fn info(&self) -> String {
        self.clone()
    }
}

impl CacheContext for u64 {
    fn info(&self) -> String {
        format!("#{}", self)
    }
}

// == Business Key ==
/// Application level key that identifies an object within its context.
pub trait BusinessKey: Ord + Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<K> BusinessKey for K where K: Ord + Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {}

// == Cacheable ==
/// An object that can live in a cache index.
pub trait Cacheable: Send + Sync + 'static {
    type Context: CacheContext;

    /// Context the object currently belongs to, if any.
    fn context(&self) -> Option<Self::Context>;

    /// Human readable type name for diagnostics.
    fn kind(&self) -> &'static str;

    /// Identifier for diagnostics.
    fn id(&self) -> String;
}

// == Composite Key ==
/// Immutable `(context, key)` pair.
///
/// Field order defines the ordering: context first, then key. This lets a
/// range `(c, from)..(c, to)` stay inside one context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey<C, K> {
    context: C,
    key: K,
}

impl<C: CacheContext, K: BusinessKey> CompositeKey<C, K> {
    /// Builds a key, failing with `InvalidKey` when either part is missing.
    pub fn new(context: Option<C>, key: Option<K>) -> Result<Self> {
        match (context, key) {
            (Some(context), Some(key)) => Ok(Self { context, key }),
            (None, Some(key)) => Err(CacheError::InvalidKey(format!(
                "missing context for key {}",
                key
            ))),
            (Some(context), None) => Err(CacheError::InvalidKey(format!(
                "missing business key in context {}",
                context.info()
            ))),
            (None, None) => Err(CacheError::InvalidKey(
                "missing context and business key".to_string(),
            )),
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn key(&self) -> &K {
        &self.key
    }
}

thread_local! {
    static RENDERING: Cell<bool> = const { Cell::new(false) };
}

/// Clears the rendering flag when the outermost render finishes.
struct RenderGuard;

impl Drop for RenderGuard {
    fn drop(&mut self) {
        RENDERING.with(|flag| flag.set(false));
    }
}

impl<C: CacheContext, K: BusinessKey> fmt::Display for CompositeKey<C, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Context info may itself render a key of this index.
        if RENDERING.with(|flag| flag.replace(true)) {
            return f.write_str("?");
        }
        let _guard = RenderGuard;
        write!(f, "{}:{}", self.context.info(), self.key)
    }
}
