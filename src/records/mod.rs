//! Records Module
//!
//! The business object served by the cache server: tenant-scoped records,
//! the authoritative table they live in and the indexes that cache them.

mod indexes;
mod table;

use serde::{Deserialize, Serialize};

use crate::cache::{Cacheable, ObjectCache};
use crate::config::Config;
use crate::error::Result;

pub use indexes::{RecordByCode, RecordById, BY_CODE, BY_ID};
pub use table::RecordTable;

// == Record ==
/// A tenant-scoped record with a numeric id and a unique code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub tenant: String,
    pub id: i64,
    pub code: String,
    pub name: String,
}

impl Record {
    pub fn new(
        tenant: impl Into<String>,
        id: i64,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            id,
            code: code.into(),
            name: name.into(),
        }
    }
}

impl Cacheable for Record {
    type Context = String;

    /// Records without a tenant are not cacheable.
    fn context(&self) -> Option<String> {
        Some(self.tenant.clone()).filter(|tenant| !tenant.is_empty())
    }

    fn kind(&self) -> &'static str {
        "Record"
    }

    fn id(&self) -> String {
        self.id.to_string()
    }
}

/// Builds the record cache with its id and code indexes over `table`.
pub fn record_cache(table: &RecordTable, config: &Config) -> Result<ObjectCache<Record>> {
    let mut cache = ObjectCache::from_config("records", config);
    cache.add_index(RecordById::index(table.clone()))?;
    cache.add_index(RecordByCode::index(table.clone()))?;
    Ok(cache)
}
