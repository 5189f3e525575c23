//! Record index definitions.

use crate::cache::{CacheIndex, IndexDefinition};
use crate::error::Result;
use crate::records::{Record, RecordTable};

/// Name of the id index.
pub const BY_ID: &str = "by_id";
/// Name of the code index.
pub const BY_CODE: &str = "by_code";

/// Indexes records by numeric id.
#[derive(Debug, Clone)]
pub struct RecordById {
    table: RecordTable,
}

impl RecordById {
    pub fn index(table: RecordTable) -> CacheIndex<Record, Self> {
        CacheIndex::new(BY_ID, Self { table })
    }
}

impl IndexDefinition<Record> for RecordById {
    type Key = i64;

    fn extract(&self, record: &Record) -> Option<i64> {
        Some(record.id)
    }

    fn select(&self, tenant: &String, id: &i64) -> Result<Option<Record>> {
        self.table.find_by_id(tenant, *id)
    }
}

/// Indexes records by code. Records without a code are not indexed.
#[derive(Debug, Clone)]
pub struct RecordByCode {
    table: RecordTable,
}

impl RecordByCode {
    pub fn index(table: RecordTable) -> CacheIndex<Record, Self> {
        CacheIndex::new(BY_CODE, Self { table })
    }
}

impl IndexDefinition<Record> for RecordByCode {
    type Key = String;

    fn extract(&self, record: &Record) -> Option<String> {
        Some(record.code.clone()).filter(|code| !code.is_empty())
    }

    fn select(&self, tenant: &String, code: &String) -> Result<Option<Record>> {
        // Blank codes are never indexed, so they never resolve either
        if code.is_empty() {
            return Ok(None);
        }
        self.table.find_by_code(tenant, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn table() -> RecordTable {
        let table = RecordTable::new();
        table.upsert(Record::new("t", 1, "A", "one")).unwrap();
        table
    }

    #[test]
    fn test_by_id_select() {
        let index = RecordById::index(table());
        let record = index.select(&"t".to_string(), &1).unwrap().unwrap();
        assert_eq!(record.code, "A");
        assert!(index.select(&"t".to_string(), &2).unwrap().is_none());
    }

    #[test]
    fn test_by_code_select() {
        let index = RecordByCode::index(table());
        let record = index
            .select(&"t".to_string(), &"A".to_string())
            .unwrap()
            .unwrap();
        assert_eq!(record.id, 1);
    }

    #[test]
    fn test_empty_code_not_indexed() {
        let mut index = RecordByCode::index(table());
        assert!(index.extract(&Record::new("t", 3, "", "blank")).is_none());
        assert!(!index.add(Arc::new(Record::new("t", 3, "", "blank"))));
        assert!(index.is_empty());
    }

    #[test]
    fn test_empty_code_never_selected() {
        let table = table();
        table.upsert(Record::new("t", 3, "", "blank")).unwrap();
        let index = RecordByCode::index(table);

        assert!(index.select(&"t".to_string(), &String::new()).unwrap().is_none());
    }
}
