//! Health Check API Handler

use axum::Json;
use serde_json::{Value as JsonValue, json};

/// GET /health
/// Liveness only; the document store is not checked
pub async fn health_check() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
