//! Test Task API Handlers
//!
//! Submit dry runs and poll their results.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use pipeconf_core::domain::test_task::TestTask;
use pipeconf_core::dto::test_task::{SubmitTest, TestAccepted};
use uuid::Uuid;

use super::AppState;
use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;

/// POST /test
/// Accepts the request and returns the task id to poll
pub async fn submit_test(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SubmitTest>,
) -> ApiResult<(StatusCode, Json<TestAccepted>)> {
    let task_id = state.tracker.create_task(req).await?;
    Ok((StatusCode::ACCEPTED, Json(TestAccepted { task_id })))
}

/// GET /test/{task_id}
pub async fn get_test(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TestTask>> {
    let task = state.tracker.get_task(task_id).await?;
    Ok(Json(task))
}
