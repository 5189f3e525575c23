//! Error types for the object cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache indexes, the owning cache and the HTTP layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Context or business key missing while building a composite key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Illegal ownership change or index lookup by the wrong type
    #[error("Illegal state: {0}")]
    State(String),

    /// Object's derived key no longer matches the key it is stored under
    #[error("Cache corruption in index '{index}': {kind} {id} is stored under {expected} but now maps to {found}")]
    Corruption {
        index: String,
        kind: String,
        id: String,
        expected: String,
        found: String,
    },

    /// Duplicate key on a uniqueness-asserting insert
    #[error("Unique violation in index '{index}': key {key} already taken")]
    UniqueViolation { index: String, key: String },

    /// Object, index or record expected to exist but missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authoritative store failed while selecting a missing object
    #[error("Select failed: {0}")]
    Select(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Returns true for faults that leave an index ordering untrustworthy.
    pub fn is_corruption(&self) -> bool {
        matches!(self, CacheError::Corruption { .. })
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidKey(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::UniqueViolation { .. } | CacheError::Corruption { .. } => {
                StatusCode::CONFLICT
            }
            CacheError::State(_) | CacheError::Select(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corruption_message_names_both_keys() {
        let err = CacheError::Corruption {
            index: "by_id".to_string(),
            kind: "Record".to_string(),
            id: "7".to_string(),
            expected: "tenantA:7".to_string(),
            found: "tenantA:8".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("by_id"));
        assert!(msg.contains("tenantA:7"));
        assert!(msg.contains("tenantA:8"));
        assert!(err.is_corruption());
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (CacheError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (CacheError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                CacheError::UniqueViolation {
                    index: "by_code".into(),
                    key: "a:b".into(),
                },
                StatusCode::CONFLICT,
            ),
            (CacheError::Select("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert!(!err.is_corruption());
            assert_eq!(err.into_response().status(), status);
        }
    }
}
