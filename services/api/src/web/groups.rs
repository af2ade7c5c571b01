//! services/api/src/web/groups.rs
//!
//! REST handlers for student groups, addressed by path segment.

use crate::web::{
    rest::{require_text, ApiJson, ApiPath, RestResult},
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use lesson_planner_core::{
    domain::StudentGroup,
    payloads::{ApiErrorBody, CreatedResponse, GroupInput, GroupPatch, SuccessResponse},
};
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    get,
    path = "/api/groups",
    responses((status = 200, description = "All groups by name", body = Vec<StudentGroup>))
)]
pub async fn list_groups(State(app_state): State<Arc<AppState>>) -> RestResult<impl IntoResponse> {
    Ok(Json(app_state.repo.list_groups().await?))
}

#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    params(("id" = i64, Path, description = "Group id")),
    responses(
        (status = 200, description = "The group with its member ids", body = StudentGroup),
        (status = 404, description = "Unknown group id", body = ApiErrorBody)
    )
)]
pub async fn get_group(
    State(app_state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> RestResult<impl IntoResponse> {
    Ok(Json(app_state.repo.get_group(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = GroupInput,
    responses(
        (status = 201, description = "Group created", body = CreatedResponse),
        (status = 400, description = "Missing name", body = ApiErrorBody)
    )
)]
pub async fn create_group(
    State(app_state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<GroupInput>,
) -> RestResult<impl IntoResponse> {
    require_text(&input.name, "Name")?;
    let group = app_state.repo.create_group(input).await?;
    info!("Created group {} '{}'", group.id, group.name);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id: group.id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/groups/{id}",
    params(("id" = i64, Path, description = "Group id")),
    request_body = GroupPatch,
    responses(
        (status = 200, description = "Group updated", body = SuccessResponse),
        (status = 404, description = "Unknown group id", body = ApiErrorBody)
    )
)]
pub async fn update_group(
    State(app_state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<GroupPatch>,
) -> RestResult<impl IntoResponse> {
    if let Some(name) = &patch.name {
        require_text(name, "Name")?;
    }
    app_state.repo.update_group(id, patch).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Delete a group. Its students stay and lose their group.
#[utoipa::path(
    delete,
    path = "/api/groups/{id}",
    params(("id" = i64, Path, description = "Group id")),
    responses(
        (status = 200, description = "Group deleted", body = SuccessResponse),
        (status = 404, description = "Unknown group id", body = ApiErrorBody)
    )
)]
pub async fn delete_group(
    State(app_state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> RestResult<impl IntoResponse> {
    app_state.repo.delete_group(id).await?;
    info!("Deleted group {}", id);
    Ok(Json(SuccessResponse { success: true }))
}
