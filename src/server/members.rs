use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::{json_body, AppState, DeleteParams, OkResponse};
use crate::models::{Member, MemberUpdate};

#[derive(Debug, Default, Deserialize)]
pub struct CreateMemberRequest {
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMemberRequest {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub checked_in: Option<bool>,
}

#[tracing::instrument(skip(state))]
pub async fn create_member(
    State(state): State<AppState>,
    body: Result<Json<CreateMemberRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Member>)> {
    let request = json_body(body)?;
    let group_id = request
        .group_id
        .ok_or_else(|| ApiError::Validation("group_id is required".to_string()))?;

    let member = state
        .store
        .members()
        .await?
        .create(group_id, request.name.as_deref())
        .await?;
    tracing::info!(id = member.id, group_id, "Member created");
    Ok((StatusCode::CREATED, Json(member)))
}

#[tracing::instrument(skip(state))]
pub async fn update_member(
    State(state): State<AppState>,
    body: Result<Json<UpdateMemberRequest>, JsonRejection>,
) -> ApiResult<Json<Member>> {
    let request = json_body(body)?;
    let id = request
        .id
        .ok_or_else(|| ApiError::Validation("id is required".to_string()))?;

    let update = MemberUpdate {
        name: request.name,
        checked_in: request.checked_in,
    };
    let member = state.store.members().await?.update(id, &update).await?;
    Ok(Json(member))
}

#[tracing::instrument(skip(state))]
pub async fn delete_member(
    State(state): State<AppState>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> ApiResult<Json<OkResponse>> {
    let Query(params) = params?;
    let id = params
        .id
        .ok_or_else(|| ApiError::Validation("id is required".to_string()))?;

    state.store.members().await?.delete(id).await?;
    tracing::info!(id, "Member deleted");
    Ok(Json(OkResponse { ok: true }))
}
