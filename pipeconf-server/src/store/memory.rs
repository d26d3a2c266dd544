//! In-memory document store
//!
//! Keeps every collection in a map behind a single async lock. Search
//! evaluates the same filter/sort/page semantics as the Elasticsearch
//! backend, so repositories behave identically on both.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use super::{DocumentStore, Filter, SearchQuery, SearchResult, StoreError};

type Collection = HashMap<String, JsonValue>;

/// Process-local document store
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn index(
        &self,
        collection: &str,
        id: &str,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<JsonValue, StoreError> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn search(
        &self,
        collection: &str,
        query: &SearchQuery,
    ) -> Result<SearchResult, StoreError> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(SearchResult::default());
        };

        let mut matches: Vec<(&String, &JsonValue)> = docs
            .iter()
            .filter(|(_, doc)| query.filters.iter().all(|f| matches_filter(doc, f)))
            .collect();

        matches.sort_by(|(id_a, a), (id_b, b)| {
            query
                .sort_desc
                .iter()
                .map(|field| compare_values(b.get(field), a.get(field)))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
                .then_with(|| id_a.cmp(id_b))
        });

        let total = matches.len() as u64;
        let (from, size) = query.window();
        let hits = matches
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(_, doc)| doc.clone())
            .collect();

        Ok(SearchResult { total, hits })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collection, id))
    }
}

// =============================================================================
// Query Evaluation
// =============================================================================

fn matches_filter(doc: &JsonValue, filter: &Filter) -> bool {
    match filter {
        Filter::Term { field, value } => doc.get(field).is_some_and(|v| field_matches(v, value)),
        Filter::Terms { field, values } => doc
            .get(field)
            .is_some_and(|v| values.iter().any(|candidate| field_matches(v, candidate))),
    }
}

/// An array field matches when any element equals the candidate
fn field_matches(field: &JsonValue, candidate: &JsonValue) -> bool {
    match field {
        JsonValue::Array(items) => items.contains(candidate),
        other => other == candidate,
    }
}

/// Orders numbers numerically and RFC 3339 strings chronologically.
/// Missing values sort below present ones.
fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
