//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_record_handler, get_record_by_code_handler, get_record_handler, health_handler,
    invalidate_handler, list_records_handler, put_record_handler, stats_handler, verify_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /records` - Store a record
/// - `GET /records/:tenant` - List cached records by id range
/// - `GET /records/:tenant/:id` - Retrieve a record by id
/// - `DELETE /records/:tenant/:id` - Delete a record
/// - `GET /codes/:tenant/:code` - Retrieve a record by code
/// - `GET /stats` - Get cache statistics
/// - `POST /invalidate` - Drop every cached record
/// - `POST /verify` - Run a consistency sweep
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/records", put(put_record_handler))
        .route("/records/:tenant", get(list_records_handler))
        .route(
            "/records/:tenant/:id",
            get(get_record_handler).delete(delete_record_handler),
        )
        .route("/codes/:tenant/:code", get(get_record_by_code_handler))
        .route("/stats", get(stats_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/verify", post(verify_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
