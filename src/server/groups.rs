use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::{json_body, AppState, DeleteParams, OkResponse};
use crate::models::Group;

#[derive(Debug, Default, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameGroupRequest {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn list_groups(State(state): State<AppState>) -> ApiResult<Json<Vec<Group>>> {
    let groups = state.store.groups().await?.list_all().await?;
    Ok(Json(groups))
}

#[tracing::instrument(skip(state))]
pub async fn create_group(
    State(state): State<AppState>,
    body: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Group>)> {
    let request = json_body(body)?;
    let group = state
        .store
        .groups()
        .await?
        .create(request.name.as_deref())
        .await?;
    tracing::info!(id = group.id, "Group created");
    Ok((StatusCode::CREATED, Json(group)))
}

#[tracing::instrument(skip(state))]
pub async fn rename_group(
    State(state): State<AppState>,
    body: Result<Json<RenameGroupRequest>, JsonRejection>,
) -> ApiResult<Json<Group>> {
    let request = json_body(body)?;
    let (Some(id), Some(name)) = (request.id, request.name) else {
        return Err(ApiError::Validation("id and name are required".to_string()));
    };

    let group = state.store.groups().await?.rename(id, &name).await?;
    Ok(Json(group))
}

#[tracing::instrument(skip(state))]
pub async fn delete_group(
    State(state): State<AppState>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Query(params) = params?;
    let id = params
        .id
        .ok_or_else(|| ApiError::Validation("id is required".to_string()))?;

    state.store.groups().await?.delete(id).await?;
    tracing::info!(id, "Group deleted");
    Ok(Json(OkResponse { ok: true }))
}
