//! API Module
//!
//! HTTP handlers and routing for the record cache server.
//!
//! # Endpoints
//! - `PUT /records` - Store a record
//! - `GET /records/:tenant` - List cached records by id range
//! - `GET|DELETE /records/:tenant/:id` - Retrieve or delete a record
//! - `GET /codes/:tenant/:code` - Retrieve a record by code
//! - `GET /stats` - Get cache statistics
//! - `POST /invalidate`, `POST /verify` - Cache maintenance
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
