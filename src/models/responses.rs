//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::records::Record;

/// Response body for single record lookups
#[derive(Debug, Clone, Serialize)]
pub struct RecordResponse {
    pub record: Record,
}

impl RecordResponse {
    pub fn new(record: Record) -> Self {
        Self { record }
    }
}

/// Response body for PUT /records
#[derive(Debug, Clone, Serialize)]
pub struct PutRecordResponse {
    /// Success message
    pub message: String,
    /// True when an existing record was replaced
    pub replaced: bool,
    pub record: Record,
}

impl PutRecordResponse {
    pub fn new(record: Record, replaced: bool) -> Self {
        let verb = if replaced { "updated" } else { "created" };
        Self {
            message: format!("Record '{}:{}' {}", record.tenant, record.id, verb),
            replaced,
            record,
        }
    }
}

/// Response body for GET /records/:tenant
#[derive(Debug, Clone, Serialize)]
pub struct RecordListResponse {
    pub tenant: String,
    pub count: usize,
    pub records: Vec<Record>,
}

impl RecordListResponse {
    pub fn new(tenant: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            tenant: tenant.into(),
            count: records.len(),
            records,
        }
    }
}

/// Response body for DELETE /records/:tenant/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    pub tenant: String,
    pub id: i64,
}

impl DeleteResponse {
    pub fn new(tenant: impl Into<String>, id: i64) -> Self {
        let tenant = tenant.into();
        Self {
            message: format!("Record '{}:{}' deleted successfully", tenant, id),
            tenant,
            id,
        }
    }
}

/// Response body for POST /invalidate
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub invalidations: u64,
}

impl InvalidateResponse {
    pub fn new(invalidations: u64) -> Self {
        Self {
            message: "Cache invalidated".to_string(),
            invalidations,
        }
    }
}

/// Response body for POST /verify
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    /// Number of index entries checked
    pub verified: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
