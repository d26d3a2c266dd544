//! Configuration DTOs

use serde::{Deserialize, Serialize};

use crate::domain::config::{ConfigCategory, PipelineConfig};

/// Request to create a new configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConfig {
    /// Caller-chosen id; one is generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ConfigCategory,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request to replace a configuration's mutable fields
///
/// `enabled` is only applied when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ConfigCategory,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Filter and pagination for listing configurations
///
/// Missing or out-of-range `page`/`page_size` values are clamped by the
/// service rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct ListConfigs {
    pub category: Option<ConfigCategory>,
    /// Matches configurations carrying any of these tags
    pub tags: Vec<String>,
    pub enabled: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// One page of configurations plus the total number of matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPage {
    pub items: Vec<PipelineConfig>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

/// Request to restore the content of an earlier version
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RollbackConfig {
    pub version: u64,
}
