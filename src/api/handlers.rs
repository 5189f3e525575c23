//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::warn;

use crate::cache::{CacheStats, ObjectCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, HealthResponse, InvalidateResponse, PutRecordRequest, PutRecordResponse,
    RangeQuery, RecordListResponse, RecordResponse, VerifyResponse,
};
use crate::records::{record_cache, Record, RecordByCode, RecordById, RecordTable, BY_CODE, BY_ID};

/// Application state shared across all handlers.
///
/// The record cache sits behind one lock that every handler holds for its
/// whole read-verify or write sequence.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe record cache
    pub cache: Arc<RwLock<ObjectCache<Record>>>,
    /// Authoritative record storage
    pub table: RecordTable,
}

impl AppState {
    /// Creates a new AppState over an existing cache and table.
    pub fn new(cache: ObjectCache<Record>, table: RecordTable) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            table,
        }
    }

    /// Creates a new AppState from configuration with an empty table.
    pub fn from_config(config: &Config) -> Result<Self> {
        let table = RecordTable::new();
        let cache = record_cache(&table, config)?;
        Ok(Self::new(cache, table))
    }
}

fn record_not_found(tenant: &str, key: impl std::fmt::Display) -> CacheError {
    CacheError::NotFound(format!("record {}:{}", tenant, key))
}

/// Handler for PUT /records
///
/// Stores a record in the table and refreshes its cached version.
pub async fn put_record_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRecordRequest>,
) -> Result<Json<PutRecordResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let record = req.into_record();

    let mut cache = state.cache.write().await;
    let previous = state.table.upsert(record.clone())?;
    if let Some(previous) = &previous {
        cache.evict(previous);
    }
    if let Err(err) = cache.insert(Arc::new(record.clone())) {
        // The table is authoritative, a clash here means the cache is stale
        warn!(error = %err, "cache disagrees with record table, invalidating");
        cache.invalidate();
    }

    Ok(Json(PutRecordResponse::new(record, previous.is_some())))
}

/// Handler for GET /records/:tenant/:id
///
/// Looks the record up through the id index, loading it from the table on a miss.
pub async fn get_record_handler(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, i64)>,
) -> Result<Json<RecordResponse>> {
    let mut cache = state.cache.write().await;
    let record = cache
        .load::<RecordById>(BY_ID, Some(&tenant), Some(&id))?
        .ok_or_else(|| record_not_found(&tenant, id))?;

    Ok(Json(RecordResponse::new(Record::clone(&record))))
}

/// Handler for GET /codes/:tenant/:code
pub async fn get_record_by_code_handler(
    State(state): State<AppState>,
    Path((tenant, code)): Path<(String, String)>,
) -> Result<Json<RecordResponse>> {
    let mut cache = state.cache.write().await;
    let record = cache
        .load::<RecordByCode>(BY_CODE, Some(&tenant), Some(&code))?
        .ok_or_else(|| record_not_found(&tenant, &code))?;

    Ok(Json(RecordResponse::new(Record::clone(&record))))
}

/// Handler for GET /records/:tenant?from=&to=
///
/// Lists the cached records of a tenant with ids in `[from, to)`.
pub async fn list_records_handler(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<RecordListResponse>> {
    let (from, to) = query.bounds();
    let mut cache = state.cache.write().await;
    let records = cache.get_range::<RecordById>(BY_ID, Some(&tenant), Some(&from), Some(&to))?;

    let records = records.iter().map(|record| Record::clone(record)).collect();
    Ok(Json(RecordListResponse::new(tenant, records)))
}

/// Handler for DELETE /records/:tenant/:id
pub async fn delete_record_handler(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, i64)>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.write().await;
    let removed = state
        .table
        .delete(&tenant, id)?
        .ok_or_else(|| record_not_found(&tenant, id))?;
    cache.evict(&removed);

    Ok(Json(DeleteResponse::new(tenant, id)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    let cache = state.cache.read().await;
    Json(cache.stats())
}

/// Handler for POST /invalidate
pub async fn invalidate_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let mut cache = state.cache.write().await;
    cache.invalidate();
    Json(InvalidateResponse::new(cache.stats().invalidations))
}

/// Handler for POST /verify
///
/// Runs a full consistency sweep over every index.
pub async fn verify_handler(State(state): State<AppState>) -> Result<Json<VerifyResponse>> {
    let mut cache = state.cache.write().await;
    let verified = cache.verify()?;
    Ok(Json(VerifyResponse { verified }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::from_config(&Config::default()).unwrap()
    }

    fn put_request(tenant: &str, id: i64, code: &str) -> PutRecordRequest {
        PutRecordRequest {
            tenant: tenant.to_string(),
            id,
            code: code.to_string(),
            name: format!("record {}", id),
        }
    }

    async fn put(state: &AppState, tenant: &str, id: i64, code: &str) -> Result<Json<PutRecordResponse>> {
        put_record_handler(State(state.clone()), Json(put_request(tenant, id, code))).await
    }

    #[tokio::test]
    async fn test_put_and_get_handler() {
        let state = state();

        let created = put(&state, "tenantA", 10, "A-10").await.unwrap();
        assert!(!created.replaced);

        let result = get_record_handler(State(state.clone()), Path(("tenantA".to_string(), 10)))
            .await
            .unwrap();
        assert_eq!(result.record.code, "A-10");

        let by_code = get_record_by_code_handler(
            State(state.clone()),
            Path(("tenantA".to_string(), "A-10".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(by_code.record.id, 10);
    }

    #[tokio::test]
    async fn test_put_replaces_cached_version() {
        let state = state();
        let _ = put(&state, "tenantA", 10, "OLD").await.unwrap();

        let updated = put(&state, "tenantA", 10, "NEW").await.unwrap();
        assert!(updated.replaced);

        let stale = get_record_by_code_handler(
            State(state.clone()),
            Path(("tenantA".to_string(), "OLD".to_string())),
        )
        .await;
        assert!(matches!(stale, Err(CacheError::NotFound(_))));

        let stats = stats_handler(State(state)).await;
        assert_eq!(stats.index(BY_ID).unwrap().entries, 1);
        assert_eq!(stats.index(BY_CODE).unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_put_duplicate_code_conflicts() {
        let state = state();
        let _ = put(&state, "tenantA", 10, "A").await.unwrap();

        let result = put(&state, "tenantA", 11, "A").await;
        assert!(matches!(result, Err(CacheError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_get_loads_after_invalidate() {
        let state = state();
        let _ = put(&state, "tenantA", 10, "A-10").await.unwrap();

        let invalidated = invalidate_handler(State(state.clone())).await;
        assert_eq!(invalidated.invalidations, 1);
        assert_eq!(stats_handler(State(state.clone())).await.index(BY_ID).unwrap().entries, 0);

        let result = get_record_handler(State(state.clone()), Path(("tenantA".to_string(), 10)))
            .await
            .unwrap();
        assert_eq!(result.record.id, 10);
        assert_eq!(stats_handler(State(state)).await.index(BY_ID).unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent_record() {
        let result = get_record_handler(State(state()), Path(("tenantA".to_string(), 1))).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_records_range() {
        let state = state();
        for id in [10, 20, 30] {
            let _ = put(&state, "tenantA", id, &format!("A-{}", id)).await.unwrap();
        }
        let _ = put(&state, "tenantB", 25, "B-25").await.unwrap();

        let query = RangeQuery {
            from: Some(15),
            to: Some(30),
        };
        let result = list_records_handler(State(state), Path("tenantA".to_string()), Query(query))
            .await
            .unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.records[0].id, 20);
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = state();
        let _ = put(&state, "tenantA", 10, "A-10").await.unwrap();

        let result = delete_record_handler(State(state.clone()), Path(("tenantA".to_string(), 10)))
            .await;
        assert!(result.is_ok());

        let result = get_record_handler(State(state.clone()), Path(("tenantA".to_string(), 10))).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));

        let result = delete_record_handler(State(state), Path(("tenantA".to_string(), 10))).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_verify_handler() {
        let state = state();
        let first = put(&state, "tenantA", 10, "A-10").await.unwrap();
        let second = put(&state, "tenantA", 11, "").await.unwrap();
        assert!(!first.replaced);
        assert!(!second.replaced);

        let result = verify_handler(State(state)).await.unwrap();
        // Two id entries and one code entry
        assert_eq!(result.verified, 3);
    }

    #[tokio::test]
    async fn test_put_invalid_request() {
        let result = put(&state(), "", 1, "A").await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
