//! History Repository
//!
//! Append-only audit trail of configuration versions.

use chrono::Utc;
use pipeconf_core::domain::config::PipelineConfig;
use pipeconf_core::domain::history::{ChangeType, HistoryEntry};
use uuid::Uuid;

use super::Result;
use crate::store::{DocumentStore, SearchQuery, StoreError, from_document, to_document};

pub const HISTORY_COLLECTION: &str = "pipeline_config_history";

/// Most entries returned for one configuration
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Record the state of `config` after a change.
///
/// A failed append is logged and swallowed: the change it describes has
/// already been written.
pub async fn record(
    store: &dyn DocumentStore,
    config: &PipelineConfig,
    change_type: ChangeType,
    summary: &str,
    actor: &str,
) {
    let entry = HistoryEntry {
        id: Uuid::new_v4().to_string(),
        config_id: config.id.clone(),
        version: config.version,
        content: config.content.clone(),
        change_type,
        change_summary: summary.to_string(),
        modified_by: actor.to_string(),
        modified_at: Utc::now(),
    };

    if let Err(e) = append(store, &entry).await {
        tracing::warn!(
            "Failed to record {:?} history for configuration {} v{}: {}",
            change_type,
            config.id,
            config.version,
            e
        );
    }
}

/// Write one history entry
pub async fn append(
    store: &dyn DocumentStore,
    entry: &HistoryEntry,
) -> std::result::Result<(), StoreError> {
    store
        .index(HISTORY_COLLECTION, &entry.id, to_document(entry)?)
        .await
}

/// Whether any history was ever recorded for `config_id`, including for a
/// configuration that has since been deleted
pub async fn has_history(store: &dyn DocumentStore, config_id: &str) -> Result<bool> {
    let query = SearchQuery::new().term("config_id", config_id).page(0, 1);
    let result = store.search(HISTORY_COLLECTION, &query).await?;
    Ok(result.total > 0)
}

/// History of a configuration, most recent version first
pub async fn get_history(store: &dyn DocumentStore, config_id: &str) -> Result<Vec<HistoryEntry>> {
    let query = SearchQuery::new()
        .term("config_id", config_id)
        .sort_desc("version")
        .sort_desc("modified_at")
        .page(0, MAX_HISTORY_ENTRIES);

    let result = store.search(HISTORY_COLLECTION, &query).await?;

    let entries = result
        .hits
        .into_iter()
        .map(from_document)
        .collect::<std::result::Result<Vec<HistoryEntry>, _>>()?;

    Ok(entries)
}
