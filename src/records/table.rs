//! Record Table Module
//!
//! Authoritative in-memory record storage the cache selects from on a miss.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{CacheError, Result};
use crate::records::Record;

type Rows = BTreeMap<(String, i64), Record>;

// == Record Table ==
/// Shared table of records keyed by `(tenant, id)`.
///
/// Codes are unique per tenant.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    rows: Arc<RwLock<Rows>>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Rows>> {
        self.rows
            .read()
            .map_err(|_| CacheError::Select("record table lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Rows>> {
        self.rows
            .write()
            .map_err(|_| CacheError::Select("record table lock poisoned".to_string()))
    }

    // == Upsert ==
    /// Inserts or replaces a record. Returns the replaced version.
    ///
    /// Fails with `UniqueViolation` if another record of the tenant already
    /// uses the (non-empty) code.
    pub fn upsert(&self, record: Record) -> Result<Option<Record>> {
        let mut rows = self.write()?;
        let clash = !record.code.is_empty()
            && tenant_rows(&rows, &record.tenant)
                .any(|row| row.code == record.code && row.id != record.id);
        if clash {
            return Err(CacheError::UniqueViolation {
                index: "records.code".to_string(),
                key: format!("{}:{}", record.tenant, record.code),
            });
        }
        Ok(rows.insert((record.tenant.clone(), record.id), record))
    }

    // == Delete ==
    pub fn delete(&self, tenant: &str, id: i64) -> Result<Option<Record>> {
        Ok(self.write()?.remove(&(tenant.to_string(), id)))
    }

    // == Finders ==
    pub fn find_by_id(&self, tenant: &str, id: i64) -> Result<Option<Record>> {
        Ok(self.read()?.get(&(tenant.to_string(), id)).cloned())
    }

    pub fn find_by_code(&self, tenant: &str, code: &str) -> Result<Option<Record>> {
        let rows = self.read()?;
        let found = tenant_rows(&rows, tenant).find(|row| row.code == code).cloned();
        Ok(found)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

fn tenant_rows<'a>(rows: &'a Rows, tenant: &str) -> impl Iterator<Item = &'a Record> + 'a {
    let start = (tenant.to_string(), i64::MIN);
    let tenant = tenant.to_string();
    rows.range(start..)
        .take_while(move |((row_tenant, _), _)| *row_tenant == tenant)
        .map(|(_, record)| record)
}
