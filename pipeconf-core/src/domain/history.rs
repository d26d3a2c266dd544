//! Configuration history domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable audit record of one configuration version.
///
/// Written once per create, update and delete. History is the only source
/// of content for rollbacks, so entries are never rewritten or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub config_id: String,
    pub version: u64,
    pub content: String,
    pub change_type: ChangeType,
    pub change_summary: String,
    pub modified_by: String,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}
