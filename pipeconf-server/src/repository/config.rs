//! Configuration Repository
//!
//! Persists configuration documents and applies the versioning rules:
//! every write produces a new version and one history entry. There is no
//! locking; an update reads the stored document and writes the full new
//! one, so concurrent updates to the same id are last-writer-wins.

use std::collections::BTreeSet;

use chrono::Utc;
use pipeconf_core::domain::config::{ConfigCategory, PipelineConfig, TestStatus};
use pipeconf_core::domain::history::ChangeType;
use pipeconf_core::dto::config::ConfigPage;
use uuid::Uuid;

use super::history_repository;
use super::{RepositoryError, Result};
use crate::store::{DocumentStore, SearchQuery, from_document, to_document};

pub const CONFIG_COLLECTION: &str = "pipeline_configs";

/// Fields supplied by the caller when creating a configuration
#[derive(Debug, Clone)]
pub struct ConfigDraft {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub category: ConfigCategory,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub created_by: String,
}

/// Listing filter with pagination already resolved
#[derive(Debug, Clone)]
pub struct ConfigFilter {
    pub category: Option<ConfigCategory>,
    pub tags: Vec<String>,
    pub enabled: Option<bool>,
    pub page: u64,
    pub page_size: u64,
}

/// Create a new configuration at version 1
pub async fn create(store: &dyn DocumentStore, draft: ConfigDraft) -> Result<PipelineConfig> {
    let now = Utc::now();
    let id = draft
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let config = PipelineConfig {
        id,
        name: draft.name,
        description: draft.description,
        category: draft.category,
        content: draft.content,
        tags: draft.tags,
        version: 1,
        enabled: true,
        test_status: TestStatus::Untested,
        created_at: now,
        updated_at: now,
        created_by: draft.created_by.clone(),
        updated_by: draft.created_by,
    };

    store
        .index(CONFIG_COLLECTION, &config.id, to_document(&config)?)
        .await?;

    history_repository::record(
        store,
        &config,
        ChangeType::Create,
        "Configuration created",
        &config.created_by,
    )
    .await;

    Ok(config)
}

/// Find a configuration by ID
pub async fn get_by_id(store: &dyn DocumentStore, id: &str) -> Result<PipelineConfig> {
    match store.get(CONFIG_COLLECTION, id).await {
        Ok(document) => Ok(from_document(document)?),
        Err(e) if e.is_not_found() => Err(RepositoryError::NotFound(id.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Write `config` as the next version of the stored configuration.
///
/// Version, creation fields and test status are derived from the stored
/// copy; whatever the caller put in them is ignored. Changing the content
/// resets the test status to untested.
pub async fn update(
    store: &dyn DocumentStore,
    mut config: PipelineConfig,
    summary: &str,
) -> Result<PipelineConfig> {
    let stored = get_by_id(store, &config.id).await?;

    config.version = stored.version + 1;
    config.created_at = stored.created_at;
    config.created_by = stored.created_by;
    config.test_status = if config.content != stored.content {
        TestStatus::Untested
    } else {
        stored.test_status
    };
    config.updated_at = Utc::now();

    store
        .index(CONFIG_COLLECTION, &config.id, to_document(&config)?)
        .await?;

    history_repository::record(store, &config, ChangeType::Update, summary, &config.updated_by)
        .await;

    Ok(config)
}

/// Delete a configuration, keeping a final history entry
pub async fn delete(store: &dyn DocumentStore, id: &str, actor: &str) -> Result<()> {
    let stored = get_by_id(store, id).await?;

    match store.delete(CONFIG_COLLECTION, id).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Err(RepositoryError::NotFound(id.to_string())),
        Err(e) => return Err(e.into()),
    }

    history_repository::record(
        store,
        &stored,
        ChangeType::Delete,
        "Configuration deleted",
        actor,
    )
    .await;

    Ok(())
}

/// List configurations matching `filter`, most recently updated first
pub async fn list(store: &dyn DocumentStore, filter: &ConfigFilter) -> Result<ConfigPage> {
    let mut query = SearchQuery::new();

    if let Some(category) = filter.category {
        query = query.term("category", category.as_str());
    }
    if !filter.tags.is_empty() {
        query = query.terms("tags", filter.tags.iter().map(String::as_str));
    }
    if let Some(enabled) = filter.enabled {
        query = query.term("enabled", enabled);
    }

    let from = filter.page.saturating_sub(1).saturating_mul(filter.page_size);
    let query = query
        .sort_desc("updated_at")
        .page(from as usize, filter.page_size as usize);

    let result = store.search(CONFIG_COLLECTION, &query).await?;

    let items = result
        .hits
        .into_iter()
        .map(from_document)
        .collect::<std::result::Result<Vec<PipelineConfig>, _>>()?;

    Ok(ConfigPage {
        items,
        total: result.total,
        page: filter.page,
        page_size: filter.page_size,
    })
}
