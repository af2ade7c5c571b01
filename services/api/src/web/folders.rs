//! services/api/src/web/folders.rs
//!
//! REST handlers for lesson folders. Membership itself lives on the lesson
//! (`folderId`), so these routes only manage the folder records.

use crate::web::{
    rest::{require_text, ApiJson, ApiQuery, IdQuery, RestError, RestResult},
    state::AppState,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use lesson_planner_core::{
    domain::{is_palette_color, LessonFolder},
    payloads::{ApiErrorBody, CreatedResponse, FolderInput, FolderPatch, SuccessResponse},
};
use std::sync::Arc;
use tracing::info;

fn require_palette_color(color: &str) -> RestResult<()> {
    if !is_palette_color(color) {
        return Err(RestError::bad_request("Invalid color")
            .with_message(format!("{} is not one of the folder colors", color)));
    }
    Ok(())
}

/// List every folder with its lesson count, or read one when `id` is given.
#[utoipa::path(
    get,
    path = "/api/folders",
    params(IdQuery),
    responses(
        (status = 200, description = "Folders ordered by orderIndex then name, or the single folder", body = Vec<LessonFolder>),
        (status = 404, description = "Unknown folder id", body = ApiErrorBody)
    )
)]
pub async fn get_folders(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> RestResult<Response> {
    match query.id {
        Some(id) => Ok(Json(app_state.repo.get_folder(id).await?).into_response()),
        None => Ok(Json(app_state.repo.list_folders().await?).into_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/folders",
    request_body = FolderInput,
    responses(
        (status = 201, description = "Folder created", body = CreatedResponse),
        (status = 400, description = "Missing name or a color outside the palette", body = ApiErrorBody)
    )
)]
pub async fn create_folder(
    State(app_state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<FolderInput>,
) -> RestResult<impl IntoResponse> {
    require_text(&input.name, "Name")?;
    require_palette_color(&input.color)?;
    let folder = app_state.repo.create_folder(input).await?;
    info!("Created folder {} '{}'", folder.id, folder.name);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            success: true,
            id: folder.id,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/folders",
    params(IdQuery),
    request_body = FolderPatch,
    responses(
        (status = 200, description = "Folder updated", body = SuccessResponse),
        (status = 400, description = "Blank name or a color outside the palette", body = ApiErrorBody),
        (status = 404, description = "Unknown folder id", body = ApiErrorBody)
    )
)]
pub async fn update_folder(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
    ApiJson(patch): ApiJson<FolderPatch>,
) -> RestResult<impl IntoResponse> {
    let id = query.required()?;
    if let Some(name) = &patch.name {
        require_text(name, "Name")?;
    }
    if let Some(color) = &patch.color {
        require_palette_color(color)?;
    }
    app_state.repo.update_folder(id, patch).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Delete a folder. Its lessons become uncategorized.
#[utoipa::path(
    delete,
    path = "/api/folders",
    params(IdQuery),
    responses(
        (status = 200, description = "Folder deleted", body = SuccessResponse),
        (status = 404, description = "Unknown folder id", body = ApiErrorBody)
    )
)]
pub async fn delete_folder(
    State(app_state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> RestResult<impl IntoResponse> {
    let id = query.required()?;
    app_state.repo.delete_folder(id).await?;
    info!("Deleted folder {}", id);
    Ok(Json(SuccessResponse { success: true }))
}
