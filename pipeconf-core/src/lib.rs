//! Pipeconf Core
//!
//! Core types for the pipeconf configuration service.
//!
//! This crate contains:
//! - Domain types: versioned pipeline configurations, their history, and test tasks
//! - DTOs: request/response shapes exchanged with callers

pub mod domain;
pub mod dto;
