//! Data Transfer Objects
//!
//! Request and response shapes for the inbound operation surface.

pub mod config;
pub mod test_task;
