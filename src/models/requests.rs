//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::records::Record;

/// Maximum length of tenant names and record codes
pub const MAX_CODE_LENGTH: usize = 64;

/// Request body for PUT /records
///
/// # Fields
/// - `tenant`: Tenant the record belongs to
/// - `id`: Record id, unique within the tenant
/// - `code`: Business code, unique within the tenant (may be empty)
/// - `name`: Display name
#[derive(Debug, Clone, Deserialize)]
pub struct PutRecordRequest {
    pub tenant: String,
    pub id: i64,
    #[serde(default)]
    pub code: String,
    pub name: String,
}

impl PutRecordRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.tenant.is_empty() {
            return Some("Tenant cannot be empty".to_string());
        }
        if self.tenant.len() > MAX_CODE_LENGTH {
            return Some(format!(
                "Tenant exceeds maximum length of {} characters",
                MAX_CODE_LENGTH
            ));
        }
        if self.code.len() > MAX_CODE_LENGTH {
            return Some(format!(
                "Code exceeds maximum length of {} characters",
                MAX_CODE_LENGTH
            ));
        }
        if self.name.trim().is_empty() {
            return Some("Name cannot be empty".to_string());
        }
        None
    }

    pub fn into_record(self) -> Record {
        Record::new(self.tenant, self.id, self.code, self.name)
    }
}

/// Query string for GET /records/:tenant
///
/// Missing bounds default to the full id range.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl RangeQuery {
    /// Returns the `[from, to)` bounds.
    pub fn bounds(&self) -> (i64, i64) {
        (self.from.unwrap_or(i64::MIN), self.to.unwrap_or(i64::MAX))
    }
}
