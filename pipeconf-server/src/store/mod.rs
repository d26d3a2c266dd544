//! Document Store
//!
//! Access to the search-indexed document backend that holds configurations
//! and their history. Repositories talk to it only through [`DocumentStore`],
//! so the backend can be swapped without touching versioning logic.
//!
//! Two implementations ship:
//! - [`MemoryStore`]: in-process collections, used by default and in tests
//! - [`ElasticsearchStore`]: Elasticsearch REST API over reqwest

pub mod elasticsearch;
pub mod memory;
#[cfg(test)]
pub mod testing;

pub use elasticsearch::ElasticsearchStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors raised by a document store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document with this id in the collection
    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: String },

    /// Transport-level failure talking to the backend
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with an unexpected status
    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// A document could not be encoded or decoded
    #[error("invalid document: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend answered with something we could not interpret
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Deepest result a search can page to, matching Elasticsearch's default
/// `index.max_result_window`. Both backends apply it.
pub const MAX_RESULT_WINDOW: usize = 10_000;

/// A single filter clause. All clauses of a query must match.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value exactly
    Term { field: String, value: JsonValue },
    /// Field equals any of the values; an array field matches when it
    /// shares at least one element with them
    Terms {
        field: String,
        values: Vec<JsonValue>,
    },
}

/// Structured search over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub filters: Vec<Filter>,
    /// Fields to sort on, newest/highest first; later fields break ties
    pub sort_desc: Vec<String>,
    pub from: usize,
    pub size: usize,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            sort_desc: Vec::new(),
            from: 0,
            size: 10,
        }
    }

    pub fn term(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filters.push(Filter::Term {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn terms<V: Into<JsonValue>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.filters.push(Filter::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort_desc.push(field.into());
        self
    }

    pub fn page(mut self, from: usize, size: usize) -> Self {
        self.from = from;
        self.size = size;
        self
    }

    /// `(from, size)` clipped to [`MAX_RESULT_WINDOW`]. A page starting at or
    /// past the window becomes `(0, 0)`: no hits, only the total.
    pub fn window(&self) -> (usize, usize) {
        if self.from >= MAX_RESULT_WINDOW {
            (0, 0)
        } else {
            (self.from, self.size.min(MAX_RESULT_WINDOW - self.from))
        }
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// Page of raw documents plus the total number of matches
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub total: u64,
    pub hits: Vec<JsonValue>,
}

/// Key-value and search access over named collections of JSON documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a document under `id`, replacing any existing one
    async fn index(
        &self,
        collection: &str,
        id: &str,
        document: JsonValue,
    ) -> Result<(), StoreError>;

    /// Point read; `StoreError::NotFound` when the id is absent
    async fn get(&self, collection: &str, id: &str) -> Result<JsonValue, StoreError>;

    async fn search(
        &self,
        collection: &str,
        query: &SearchQuery,
    ) -> Result<SearchResult, StoreError>;

    /// Removes a document; `StoreError::NotFound` when the id is absent
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// Encodes a typed value as a store document
pub fn to_document<T: Serialize>(value: &T) -> Result<JsonValue, StoreError> {
    Ok(serde_json::to_value(value)?)
}

/// Decodes a store document into a typed value
pub fn from_document<T: DeserializeOwned>(document: JsonValue) -> Result<T, StoreError> {
    Ok(serde_json::from_value(document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_builder_collects_filters_in_order() {
        let query = SearchQuery::new()
            .term("category", "filter")
            .terms("tags", ["a", "b"])
            .sort_desc("updated_at")
            .page(20, 10);

        assert_eq!(
            query.filters,
            vec![
                Filter::Term {
                    field: "category".to_string(),
                    value: json!("filter"),
                },
                Filter::Terms {
                    field: "tags".to_string(),
                    values: vec![json!("a"), json!("b")],
                },
            ]
        );
        assert_eq!(query.sort_desc, vec!["updated_at".to_string()]);
        assert_eq!((query.from, query.size), (20, 10));
    }

    #[test]
    fn test_window_clips_deep_pages() {
        assert_eq!(SearchQuery::new().page(20, 10).window(), (20, 10));
        assert_eq!(SearchQuery::new().page(9_990, 20).window(), (9_990, 10));
        assert_eq!(SearchQuery::new().page(10_000, 20).window(), (0, 0));
        assert_eq!(SearchQuery::new().page(11_980, 20).window(), (0, 0));
    }

    #[test]
    fn test_not_found_helper() {
        let err = StoreError::not_found("configs", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document abc not found in configs");
        assert!(!StoreError::Backend("down".to_string()).is_not_found());
    }
}
