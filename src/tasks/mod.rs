//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Consistency sweep: Verifies every cached entry at configured intervals

mod verify;

pub use verify::spawn_verify_task;
