//! Configuration API Handlers
//!
//! HTTP endpoints for configuration management.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use pipeconf_core::domain::config::{ConfigCategory, PipelineConfig};
use pipeconf_core::domain::history::HistoryEntry;
use pipeconf_core::dto::config::{
    ConfigPage, CreateConfig, ListConfigs, RollbackConfig, UpdateConfig,
};
use serde::Deserialize;

use super::{AppState, user_id};
use crate::api::error::ApiResult;
use crate::api::extract::{ApiJson, ApiQuery};
use crate::service::config_service;

/// Query string for GET /config/list
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<ConfigCategory>,
    /// Comma-separated
    pub tags: Option<String>,
    pub enabled: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl From<ListParams> for ListConfigs {
    fn from(params: ListParams) -> Self {
        ListConfigs {
            category: params.category,
            tags: params
                .tags
                .map(|tags| tags.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            enabled: params.enabled,
            page: params.page,
            page_size: params.page_size,
        }
    }
}

/// POST /config
pub async fn create_config(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<CreateConfig>,
) -> ApiResult<(StatusCode, Json<PipelineConfig>)> {
    tracing::info!("Creating configuration: {}", req.name);

    let config =
        config_service::create_config(state.store.as_ref(), req, &user_id(&headers)).await?;

    Ok((StatusCode::CREATED, Json(config)))
}

/// GET /config/list
pub async fn list_configs(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<ConfigPage>> {
    tracing::debug!("Listing configurations: {:?}", params);

    let page = config_service::list_configs(state.store.as_ref(), params.into()).await?;

    Ok(Json(page))
}

/// GET /config/{id}
pub async fn get_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PipelineConfig>> {
    let config = config_service::get_config(state.store.as_ref(), &id).await?;
    Ok(Json(config))
}

/// PUT /config/{id}
pub async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<UpdateConfig>,
) -> ApiResult<Json<PipelineConfig>> {
    tracing::info!("Updating configuration: {}", id);

    let config =
        config_service::update_config(state.store.as_ref(), &id, req, &user_id(&headers)).await?;

    Ok(Json(config))
}

/// DELETE /config/{id}
pub async fn delete_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting configuration: {}", id);

    config_service::delete_config(state.store.as_ref(), &id, &user_id(&headers)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /config/{id}/history
pub async fn get_config_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<HistoryEntry>>> {
    let history = config_service::get_config_history(state.store.as_ref(), &id).await?;
    Ok(Json(history))
}

/// POST /config/{id}/rollback
pub async fn rollback_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    ApiJson(req): ApiJson<RollbackConfig>,
) -> ApiResult<Json<PipelineConfig>> {
    tracing::info!("Rolling back configuration {} to version {}", id, req.version);

    let config = config_service::rollback_config(
        state.store.as_ref(),
        &id,
        req.version,
        &user_id(&headers),
    )
    .await?;

    Ok(Json(config))
}
