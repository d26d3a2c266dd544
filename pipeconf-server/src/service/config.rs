//! Configuration Service
//!
//! Validation and orchestration on top of the configuration repository.

use std::collections::BTreeSet;

use pipeconf_core::domain::config::{ConfigCategory, PipelineConfig};
use pipeconf_core::domain::history::HistoryEntry;
use pipeconf_core::dto::config::{ConfigPage, CreateConfig, ListConfigs, UpdateConfig};
use thiserror::Error;

use crate::repository::config::{ConfigDraft, ConfigFilter};
use crate::repository::{RepositoryError, config_repository, history_repository};
use crate::store::{DocumentStore, StoreError};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

const MAX_NAME_LEN: usize = 255;

/// Service error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Validation(String),

    #[error("configuration {0} not found")]
    NotFound(String),

    #[error("configuration {0} already exists")]
    AlreadyExists(String),

    #[error("version {version} not found in history of configuration {id}")]
    VersionNotFound { id: String, version: u64 },

    #[error(transparent)]
    Store(StoreError),
}

impl From<RepositoryError> for ConfigError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => ConfigError::NotFound(id),
            RepositoryError::Store(e) => ConfigError::Store(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Create a new configuration
pub async fn create_config(
    store: &dyn DocumentStore,
    req: CreateConfig,
    user_id: &str,
) -> Result<PipelineConfig> {
    validate_fields(&req.name, req.category, &req.content)?;

    let id = req.id.filter(|id| !id.trim().is_empty());
    if let Some(id) = &id {
        ensure_id_unused(store, id).await?;
    }

    let draft = ConfigDraft {
        id,
        name: req.name,
        description: req.description,
        category: req.category,
        content: req.content,
        tags: normalize_tags(req.tags),
        created_by: user_id.to_string(),
    };

    let config = config_repository::create(store, draft).await?;

    tracing::info!("Configuration created: {} ({})", config.name, config.id);

    Ok(config)
}

/// Get a configuration by ID
pub async fn get_config(store: &dyn DocumentStore, id: &str) -> Result<PipelineConfig> {
    tracing::debug!("Fetching configuration {}", id);
    Ok(config_repository::get_by_id(store, id).await?)
}

/// Replace a configuration's mutable fields
pub async fn update_config(
    store: &dyn DocumentStore,
    id: &str,
    req: UpdateConfig,
    user_id: &str,
) -> Result<PipelineConfig> {
    validate_fields(&req.name, req.category, &req.content)?;

    let mut config = config_repository::get_by_id(store, id).await?;

    config.name = req.name;
    config.description = req.description;
    config.category = req.category;
    config.content = req.content;
    config.tags = normalize_tags(req.tags);
    if let Some(enabled) = req.enabled {
        config.enabled = enabled;
    }
    config.updated_by = user_id.to_string();

    let updated = config_repository::update(store, config, "Configuration updated").await?;

    tracing::info!(
        "Configuration updated: {} (v{})",
        updated.id,
        updated.version
    );

    Ok(updated)
}

/// Delete a configuration
pub async fn delete_config(store: &dyn DocumentStore, id: &str, user_id: &str) -> Result<()> {
    config_repository::delete(store, id, user_id).await?;

    tracing::info!("Configuration deleted: {} by {}", id, user_id);

    Ok(())
}

/// List configurations with clamped pagination
pub async fn list_configs(store: &dyn DocumentStore, req: ListConfigs) -> Result<ConfigPage> {
    let filter = ConfigFilter {
        category: req.category,
        tags: normalize_tags(req.tags).into_iter().collect(),
        enabled: req.enabled,
        page: clamp_page(req.page),
        page_size: clamp_page_size(req.page_size),
    };

    Ok(config_repository::list(store, &filter).await?)
}

/// History of an existing configuration, most recent version first
pub async fn get_config_history(store: &dyn DocumentStore, id: &str) -> Result<Vec<HistoryEntry>> {
    config_repository::get_by_id(store, id).await?;
    Ok(history_repository::get_history(store, id).await?)
}

/// Restore the content of `version` as a new version
pub async fn rollback_config(
    store: &dyn DocumentStore,
    id: &str,
    version: u64,
    user_id: &str,
) -> Result<PipelineConfig> {
    let history = history_repository::get_history(store, id).await?;

    let target = history
        .into_iter()
        .find(|entry| entry.version == version)
        .ok_or_else(|| ConfigError::VersionNotFound {
            id: id.to_string(),
            version,
        })?;

    let mut config = config_repository::get_by_id(store, id).await?;
    config.content = target.content;
    config.updated_by = user_id.to_string();

    let summary = format!("Rolled back to version {}", version);
    let updated = config_repository::update(store, config, &summary).await?;

    tracing::info!(
        "Configuration {} rolled back to version {} (now v{})",
        id,
        version,
        updated.version
    );

    Ok(updated)
}

// =============================================================================
// Validation
// =============================================================================

/// A caller-chosen id must not belong to a live configuration or to the
/// history of a deleted one
async fn ensure_id_unused(store: &dyn DocumentStore, id: &str) -> Result<()> {
    match config_repository::get_by_id(store, id).await {
        Ok(_) => return Err(ConfigError::AlreadyExists(id.to_string())),
        Err(RepositoryError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    if history_repository::has_history(store, id).await? {
        return Err(ConfigError::AlreadyExists(id.to_string()));
    }

    Ok(())
}

fn validate_fields(name: &str, category: ConfigCategory, content: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "Configuration name cannot be empty".to_string(),
        ));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ConfigError::Validation(format!(
            "Configuration name is too long (max {} characters)",
            MAX_NAME_LEN
        )));
    }

    if content.trim().is_empty() {
        return Err(ConfigError::Validation(
            "Configuration content cannot be empty".to_string(),
        ));
    }

    category
        .content_rule()
        .check(content)
        .map_err(|e| {
            ConfigError::Validation(format!("Invalid {} configuration: {}", category, e))
        })
}

fn normalize_tags(tags: Vec<String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Missing or non-positive pages fall back to the first page
fn clamp_page(page: Option<i64>) -> u64 {
    match page {
        Some(page) if page >= 1 => page as u64,
        _ => DEFAULT_PAGE,
    }
}

/// Missing or non-positive sizes fall back to the default; sizes above the
/// maximum are capped to it
fn clamp_page_size(page_size: Option<i64>) -> u64 {
    match page_size {
        Some(size) if size > MAX_PAGE_SIZE as i64 => MAX_PAGE_SIZE,
        Some(size) if size >= 1 => size as u64,
        _ => DEFAULT_PAGE_SIZE,
    }
}
