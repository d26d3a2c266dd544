//! API Module
//!
//! HTTP boundary of the server. Handlers only extract parameters, call one
//! service or tracker operation and map its errors to status codes.

pub mod config;
pub mod error;
pub mod extract;
pub mod health;
pub mod test_task;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderMap, Method},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::TestTracker;
use crate::store::DocumentStore;

/// Header carrying the acting user's identity
pub const USER_ID_HEADER: &str = "x-user-id";
pub const ANONYMOUS_USER: &str = "anonymous";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub tracker: TestTracker,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Configuration endpoints
        .route("/config", post(config::create_config))
        .route("/config/list", get(config::list_configs))
        .route(
            "/config/{id}",
            get(config::get_config)
                .put(config::update_config)
                .delete(config::delete_config),
        )
        .route("/config/{id}/history", get(config::get_config_history))
        .route("/config/{id}/rollback", post(config::rollback_config))
        // Test endpoints
        .route("/test", post(test_task::submit_test))
        .route("/test/{task_id}", get(test_task::get_test))
        // Add state and middleware
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Acting user from `X-User-ID`, or `anonymous` when missing or blank
pub fn user_id(headers: &HeaderMap) -> String {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS_USER)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::TrackerSettings;
    use crate::store::MemoryStore;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{Value as JsonValue, json};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let tracker = TestTracker::new(
            Arc::clone(&store),
            TrackerSettings {
                sample_delay: Duration::ZERO,
                ..Default::default()
            },
        );
        create_router(AppState { store, tracker })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<JsonValue>) -> Response {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_ID_HEADER, "alice");

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> JsonValue {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(app: &Router, name: &str, category: &str, content: &str) -> JsonValue {
        let response = send(
            app,
            Method::POST,
            "/config",
            Some(json!({
                "name": name,
                "category": category,
                "content": content,
                "tags": ["prod"]
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    #[test]
    fn test_user_id_defaults_to_anonymous() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id(&headers), "anonymous");

        headers.insert(USER_ID_HEADER, " ".parse().unwrap());
        assert_eq!(user_id(&headers), "anonymous");

        headers.insert(USER_ID_HEADER, "bob".parse().unwrap());
        assert_eq!(user_id(&headers), "bob");
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_config_lifecycle_over_http() {
        let app = app();
        let created = create(&app, "A", "filter", "filter { }").await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["version"], 1);
        assert_eq!(created["created_by"], "alice");

        let response = send(
            &app,
            Method::PUT,
            &format!("/config/{}", id),
            Some(json!({ "name": "A", "category": "filter", "content": "filter { x }" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["version"], 2);
        assert_eq!(updated["test_status"], "untested");

        let response = send(
            &app,
            Method::POST,
            &format!("/config/{}/rollback", id),
            Some(json!({ "version": 1 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let rolled = body_json(response).await;
        assert_eq!(rolled["version"], 3);
        assert_eq!(rolled["content"], "filter { }");

        let response = send(&app, Method::GET, &format!("/config/{}/history", id), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let history = body_json(response).await;
        assert_eq!(history.as_array().unwrap().len(), 3);
        assert_eq!(history[0]["version"], 3);

        let response = send(&app, Method::DELETE, &format!("/config/{}", id), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::GET, &format!("/config/{}", id), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_validation_and_missing_version_statuses() {
        let app = app();

        let response = send(
            &app,
            Method::POST,
            "/config",
            Some(json!({ "name": "A", "category": "output", "content": "filter { }" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let created = create(&app, "A", "filter", "filter { }").await;
        let response = send(
            &app,
            Method::POST,
            &format!("/config/{}/rollback", created["id"].as_str().unwrap()),
            Some(json!({ "version": 5 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let app = app();
        let body = json!({
            "id": "fixed",
            "name": "A",
            "category": "filter",
            "content": "filter { }"
        });

        let response = send(&app, Method::POST, "/config", Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(&app, Method::POST, "/config", Some(body)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_malformed_input_gets_json_error_body() {
        let app = app();

        // Missing content
        let response = send(
            &app,
            Method::POST,
            "/config",
            Some(json!({ "name": "A", "category": "filter" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());

        // Unknown category
        let response = send(
            &app,
            Method::POST,
            "/config",
            Some(json!({ "name": "A", "category": "codec", "content": "codec { }" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());

        // Wrong type for the test source
        let response = send(
            &app,
            Method::POST,
            "/test",
            Some(json!({ "config_id": "c1", "type": "carrier-pigeon" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());

        let response = send(&app, Method::GET, "/config/list?page=abc", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_list_past_last_page_is_empty() {
        let app = app();
        create(&app, "A", "filter", "filter { }").await;

        let response = send(&app, Method::GET, "/config/list?page=600&page_size=20", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_json(response).await;
        assert_eq!(page["total"], 1);
        assert!(page["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_parses_query_string() {
        let app = app();
        create(&app, "A", "filter", "filter { }").await;
        create(&app, "B", "input", "input { }").await;
        create(&app, "C", "filter", "filter { }").await;

        let response = send(
            &app,
            Method::GET,
            "/config/list?category=filter&tags=prod,other&page=0&page_size=1",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_json(response).await;
        assert_eq!(page["total"], 2);
        assert_eq!(page["page"], 1);
        assert_eq!(page["page_size"], 1);
        assert_eq!(page["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_and_poll_test_task() {
        let app = app();
        let created = create(&app, "A", "filter", "filter { }").await;

        let response = send(
            &app,
            Method::POST,
            "/test",
            Some(json!({
                "config_id": created["id"],
                "type": "sample",
                "samples": ["one", "two"]
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let task_id = body_json(response).await["task_id"]
            .as_str()
            .unwrap()
            .to_string();

        let task = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let response = send(&app, Method::GET, &format!("/test/{}", task_id), None).await;
                assert_eq!(response.status(), StatusCode::OK);
                let task = body_json(response).await;
                if task["status"] != "running" {
                    return task;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(task["status"], "completed");
        assert_eq!(task["output_count"], 2);
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let uri = format!("/test/{}", uuid::Uuid::new_v4());
        let response = send(&app(), Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
