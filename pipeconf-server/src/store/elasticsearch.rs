//! Elasticsearch document store
//!
//! Talks to the Elasticsearch REST API. Each collection maps to one index
//! (optionally prefixed). Writes use `refresh=wait_for` so a read issued
//! right after a write observes it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::{Value as JsonValue, json};

use super::{DocumentStore, Filter, SearchQuery, SearchResult, StoreError};

/// Document store backed by an Elasticsearch cluster
#[derive(Debug, Clone)]
pub struct ElasticsearchStore {
    /// Cluster base URL (e.g., "http://localhost:9200")
    base_url: String,
    /// Prepended to every collection name to form the index name
    index_prefix: String,
    client: Client,
}

impl ElasticsearchStore {
    pub fn new(base_url: impl Into<String>, index_prefix: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            index_prefix: index_prefix.into(),
            client: Client::new(),
        }
    }

    pub fn index_name(&self, collection: &str) -> String {
        format!("{}{}", self.index_prefix, collection)
    }

    /// Creates the index backing `collection` if it does not exist yet
    pub async fn ensure_collection(&self, collection: &str) -> Result<(), StoreError> {
        let index = self.index_name(collection);
        let url = self.url(&[index.as_str()])?;

        let response = self.client.head(url.clone()).send().await?;
        if response.status().is_success() {
            return Ok(());
        }

        let response = self
            .client
            .put(url)
            .json(&collection_mapping())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Created index {}", index);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        // Another instance created it between our HEAD and PUT
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception")
        {
            return Ok(());
        }

        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Builds a URL from the base plus escaped path segments
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            StoreError::Backend(format!("invalid base URL {}: {}", self.base_url, e))
        })?;

        url.path_segments_mut()
            .map_err(|_| StoreError::Backend(format!("invalid base URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    fn doc_url(&self, collection: &str, id: &str) -> Result<Url, StoreError> {
        let index = self.index_name(collection);
        self.url(&[index.as_str(), "_doc", id])
    }
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    async fn index(
        &self,
        collection: &str,
        id: &str,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.doc_url(collection, id)?)
            .query(&[("refresh", "wait_for")])
            .json(&document)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<JsonValue, StoreError> {
        let response = self.client.get(self.doc_url(collection, id)?).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, id));
        }

        let body: JsonValue = check_status(response).await?.json().await?;
        body.get("_source")
            .cloned()
            .ok_or_else(|| StoreError::Backend(format!("document {} has no _source", id)))
    }

    async fn search(
        &self,
        collection: &str,
        query: &SearchQuery,
    ) -> Result<SearchResult, StoreError> {
        let index = self.index_name(collection);
        let url = self.url(&[index.as_str(), "_search"])?;
        let response = self
            .client
            .post(url)
            .json(&build_search_body(query))
            .send()
            .await?;

        // Nothing has been written to this collection yet
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(SearchResult::default());
        }

        let body: JsonValue = check_status(response).await?.json().await?;
        parse_search_response(body)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .delete(self.doc_url(collection, id)?)
            .query(&[("refresh", "wait_for")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, id));
        }

        check_status(response).await?;
        Ok(())
    }
}

// =============================================================================
// Request / Response Helpers
// =============================================================================

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Translates a [`SearchQuery`] into the Elasticsearch query DSL
pub fn build_search_body(query: &SearchQuery) -> JsonValue {
    let filters: Vec<JsonValue> = query
        .filters
        .iter()
        .map(|filter| match filter {
            Filter::Term { field, value } => json!({ "term": { field: value } }),
            Filter::Terms { field, values } => json!({ "terms": { field: values } }),
        })
        .collect();

    let (from, size) = query.window();
    let mut body = json!({
        "query": { "bool": { "filter": filters } },
        "from": from,
        "size": size,
        "track_total_hits": true,
    });

    if !query.sort_desc.is_empty() {
        let sort: Vec<JsonValue> = query
            .sort_desc
            .iter()
            .map(|field| json!({ field: { "order": "desc" } }))
            .collect();
        body["sort"] = JsonValue::Array(sort);
    }

    body
}

fn parse_search_response(body: JsonValue) -> Result<SearchResult, StoreError> {
    let hits = body
        .get("hits")
        .ok_or_else(|| StoreError::Backend("search response has no hits".to_string()))?;

    let total = hits
        .pointer("/total/value")
        .and_then(JsonValue::as_u64)
        .unwrap_or(0);

    let hits = hits
        .get("hits")
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|hit| hit.get("_source").cloned())
                .collect()
        })
        .unwrap_or_default();

    Ok(SearchResult { total, hits })
}

/// Index settings: strings are exact-match keywords so term filters work
/// without analyzers. Timestamps are still picked up by date detection.
fn collection_mapping() -> JsonValue {
    json!({
        "mappings": {
            "dynamic_templates": [{
                "strings_as_keywords": {
                    "match_mapping_type": "string",
                    "mapping": { "type": "keyword", "ignore_above": 8191 }
                }
            }]
        }
    })
}
