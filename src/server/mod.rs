//! HTTP API for groups and members.
//!
//! Handlers are thin: they check that required fields are present, call the
//! store, and map store failures to a 500 with the error message in the body.
//!
//! # Endpoints
//!
//! - `GET /health`: health check
//! - `GET /groups`: all groups with their members
//! - `POST /groups`, `PUT /groups`, `DELETE /groups?id=N`
//! - `POST /members`, `PUT /members`, `DELETE /members?id=N`

mod error;
mod groups;
mod members;

pub use error::{ApiError, ApiResult, ErrorBody};

use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::db::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Query parameters for the delete endpoints.
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::version(),
    })
}

/// Unwraps a JSON body. A request without a JSON content type is treated as
/// an empty object so that optional-only bodies may be omitted.
fn json_body<T: Default>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/groups",
            get(groups::list_groups)
                .post(groups::create_group)
                .put(groups::rename_group)
                .delete(groups::delete_group),
        )
        .route(
            "/members",
            post(members::create_member)
                .put(members::update_member)
                .delete(members::delete_member),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
