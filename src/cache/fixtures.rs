//! Test fixtures shared by the cache unit and property tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::{CacheIndex, Cacheable, IndexDefinition};
use crate::error::{CacheError, Result};

/// Cached test object whose id can be mutated behind an index's back.
#[derive(Debug)]
pub struct Item {
    tenant: Option<String>,
    id: Mutex<Option<i64>>,
    pub label: String,
}

impl Item {
    pub fn new(tenant: &str, id: i64, label: &str) -> Arc<Self> {
        Arc::new(Self::owned(Some(tenant), Some(id), label))
    }

    /// Item without a context.
    pub fn detached(id: i64) -> Arc<Self> {
        Arc::new(Self::owned(None, Some(id), "detached"))
    }

    /// Item that has no id yet.
    pub fn without_id(tenant: &str) -> Arc<Self> {
        Arc::new(Self::owned(Some(tenant), None, "unsaved"))
    }

    fn owned(tenant: Option<&str>, id: Option<i64>, label: &str) -> Self {
        Self {
            tenant: tenant.map(str::to_string),
            id: Mutex::new(id),
            label: label.to_string(),
        }
    }

    pub fn id_value(&self) -> Option<i64> {
        *self.id.lock().unwrap()
    }

    pub fn context_name(&self) -> String {
        self.tenant.clone().unwrap_or_default()
    }

    pub fn set_id(&self, id: Option<i64>) {
        *self.id.lock().unwrap() = id;
    }
}

impl Cacheable for Item {
    type Context = String;

    fn context(&self) -> Option<String> {
        self.tenant.clone()
    }

    fn kind(&self) -> &'static str {
        "Item"
    }

    fn id(&self) -> String {
        match self.id_value() {
            Some(id) => id.to_string(),
            None => "-".to_string(),
        }
    }
}

/// Indexes items by id; selects from an in-memory row set.
#[derive(Debug, Default)]
pub struct ItemById {
    rows: Mutex<BTreeMap<(String, i64), String>>,
    selects: AtomicUsize,
    failing: bool,
    non_unique: bool,
}

impl ItemById {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row(self, tenant: &str, id: i64, label: &str) -> Self {
        self.rows
            .lock()
            .unwrap()
            .insert((tenant.to_string(), id), label.to_string());
        self
    }

    /// Select always fails.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn non_unique(mut self) -> Self {
        self.non_unique = true;
        self
    }

    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }
}

impl IndexDefinition<Item> for ItemById {
    type Key = i64;

    fn extract(&self, object: &Item) -> Option<i64> {
        object.id_value()
    }

    fn select(&self, context: &String, key: &i64) -> Result<Option<Item>> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(CacheError::Select("item store offline".to_string()));
        }
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(&(context.clone(), *key))
            .map(|label| Item::owned(Some(context), Some(*key), label)))
    }

    fn unique(&self) -> bool {
        !self.non_unique
    }
}

/// Indexes items by label; labels may repeat.
#[derive(Debug, Default)]
pub struct ItemByLabel;

impl IndexDefinition<Item> for ItemByLabel {
    type Key = String;

    fn extract(&self, object: &Item) -> Option<String> {
        Some(object.label.clone()).filter(|label| !label.is_empty())
    }

    fn select(&self, _context: &String, _key: &String) -> Result<Option<Item>> {
        Ok(None)
    }

    fn unique(&self) -> bool {
        false
    }
}

pub fn by_id() -> CacheIndex<Item, ItemById> {
    CacheIndex::new("by_id", ItemById::new())
}

pub fn by_label() -> CacheIndex<Item, ItemByLabel> {
    CacheIndex::new("by_label", ItemByLabel)
}
