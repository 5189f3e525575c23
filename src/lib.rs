//! Appworx Cache - A context-aware multi-index object cache
//!
//! Caches business objects under `(context, business key)` composite keys in
//! ordered indexes that re-verify every object they hand out, and serves a
//! tenant-scoped record cache over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod records;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheIndex, CompositeKey, IndexDefinition, ObjectCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_verify_task;
