//! Core domain types
//!
//! These types are persisted by the server (configurations and history) or
//! held in memory while a dry run is in flight (test tasks). They are shared
//! with callers as-is through the JSON API.

pub mod config;
pub mod history;
pub mod test_task;
