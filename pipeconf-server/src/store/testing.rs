//! Test doubles for the document store

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use super::{DocumentStore, MemoryStore, SearchQuery, SearchResult, StoreError};

/// Memory store that rejects every write to one collection
#[derive(Debug, Default)]
pub struct FailingWrites {
    pub inner: MemoryStore,
    pub collection: String,
}

impl FailingWrites {
    pub fn on(collection: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            collection: collection.to_string(),
        }
    }
}

#[async_trait]
impl DocumentStore for FailingWrites {
    async fn index(
        &self,
        collection: &str,
        id: &str,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        if collection == self.collection {
            return Err(StoreError::Backend("injected write failure".to_string()));
        }
        self.inner.index(collection, id, document).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<JsonValue, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn search(
        &self,
        collection: &str,
        query: &SearchQuery,
    ) -> Result<SearchResult, StoreError> {
        self.inner.search(collection, query).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }
}
