//! Service Module
//!
//! Business logic layer for the server.
//! Services validate caller input and orchestrate repository calls; the
//! test tracker owns the in-memory dry-run registry.

pub mod config;
pub mod test_task;

// Re-export for convenience
pub use config as config_service;
pub use test_task::{TestTracker, TrackerSettings};
